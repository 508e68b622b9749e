//! 批量处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责按顺序处理所有访问码。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：加载场景库和访问码，初始化输出日志
//! 2. **顺序执行**：一次只跑一个会话，会话之间等待固定间隔
//! 3. **失败隔离**：单个访问码失败不影响后续访问码
//! 4. **中止处理**：会话被中止时不再开始新的会话
//! 5. **全局统计**：汇总为 BatchReport 并写入结果目录

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::browser::CdpContextFactory;
use crate::config::{Config, ProfileConfig};
use crate::error::AppResult;
use crate::models::{load_access_codes, load_scenario_store, BatchReport, ScenarioStore, SessionOutcome};
use crate::orchestrator::session_runner::SessionRunner;
use crate::services::ReportWriter;
use crate::utils::logging::{init_log_file, log_session_start, log_startup, print_final_stats};
use crate::workflow::{AbortSignal, SessionCtx, SessionFlow, StdinOperator};

/// 批量处理器
pub struct BatchProcessor {
    runner: SessionRunner,
    profile: ProfileConfig,
    inter_session_delay: Duration,
    seed: Option<u64>,
    writer: Option<ReportWriter>,
}

impl BatchProcessor {
    pub fn new(runner: SessionRunner, profile: ProfileConfig, inter_session_delay: Duration) -> Self {
        Self {
            runner,
            profile,
            inter_session_delay,
            seed: None,
            writer: None,
        }
    }

    /// 固定用户资料的随机种子
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// 每个会话结束后向输出日志追加一行
    pub fn with_writer(mut self, writer: ReportWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn writer(&self) -> Option<&ReportWriter> {
        self.writer.as_ref()
    }

    /// 顺序处理所有访问码
    pub async fn run(&self, codes: &[String]) -> BatchReport {
        let batch_id = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut report = BatchReport::new(batch_id);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let abort = self.runner.abort_signal();
        let total = codes.len();

        for (idx, code) in codes.iter().enumerate() {
            if abort.is_raised() {
                warn!("⏹ 收到中止信号，剩余 {} 个访问码不再处理", total - idx);
                break;
            }
            if idx > 0 && !self.inter_session_delay.is_zero() {
                info!("⏳ 等待 {}s 后处理下一个访问码", self.inter_session_delay.as_secs_f32());
                tokio::time::sleep(self.inter_session_delay).await;
            }

            log_session_start(idx + 1, total, code);
            let ctx = SessionCtx::new(code.clone(), idx + 1, total, self.profile.resolve(&mut rng));
            let record = self.runner.run(ctx).await;

            if let Some(writer) = &self.writer {
                if let Err(e) = writer.append_session(&record).await {
                    warn!("写入会话记录失败: {}", e);
                }
            }

            let aborted = record.outcome == Some(SessionOutcome::Aborted);
            report.push(record);
            if aborted {
                warn!("⏹ 会话被中止，批次结束");
                break;
            }
        }

        report.finalize();
        report
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<ScenarioStore>,
    codes: Vec<String>,
    abort: AbortSignal,
}

impl App {
    /// 初始化应用：加载场景库与访问码
    pub async fn initialize(config: Config, abort: AbortSignal) -> AppResult<Self> {
        let store = load_scenario_store(Path::new(&config.scenario_file)).await?;

        let mut codes = config.access_codes.clone();
        if let Some(path) = &config.access_code_file {
            for code in load_access_codes(Path::new(path)).await? {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
        }

        log_startup(&config, store.len(), codes.len());

        Ok(Self {
            config,
            store: Arc::new(store),
            codes,
            abort,
        })
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// 只打印将要执行的内容
    pub fn dry_run(&self) {
        info!("🧪 演练模式：不会启动浏览器");
        for (idx, code) in self.codes.iter().enumerate() {
            info!("   {}. {}", idx + 1, code);
        }
        let mut keys: Vec<_> = self.store.iter().collect();
        keys.sort_by(|a, b| a.0.cmp(b.0));
        for (key, descriptor) in keys {
            info!("   [{}] {}", descriptor.action_type, key);
        }
    }

    /// 运行应用主逻辑，返回批量报告
    pub async fn run(&self) -> Result<BatchReport> {
        if self.codes.is_empty() {
            warn!("⚠️ 没有待处理的访问码，程序结束");
            return Ok(BatchReport::new("empty"));
        }

        init_log_file(&self.config.output_log_file)?;

        let flow = SessionFlow::new(&self.config, Arc::clone(&self.store));
        let factory = Arc::new(CdpContextFactory::new(
            self.config.survey.clone(),
            self.config.browser.clone(),
            self.config.timing.clone(),
        ));
        let runner = SessionRunner::new(
            flow,
            factory,
            Arc::new(StdinOperator),
            self.abort.clone(),
            self.config.retry_bound,
        );
        let writer = ReportWriter::new(&self.config.results_dir, &self.config.output_log_file);
        let processor = BatchProcessor::new(
            runner,
            self.config.profile.clone(),
            self.config.inter_session_delay(),
        )
        .with_seed(self.config.random_seed)
        .with_writer(writer);

        let report = processor.run(&self.codes).await;

        if let Some(writer) = processor.writer() {
            let path = writer.save(&report).await?;
            info!("💾 批量报告已保存: {}", path.display());
        }
        print_final_stats(&report, &self.config.output_log_file);

        Ok(report)
    }
}

//! 报告写入服务 - 业务能力层
//!
//! 只负责"把结果落盘"，不关心流程

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::models::{BatchReport, SessionOutcome, SessionRecord};

/// 报告写入服务
///
/// 职责：
/// - 每个会话结束后向输出日志追加一行
/// - 批次结束后把 BatchReport 写成 JSON
pub struct ReportWriter {
    results_dir: PathBuf,
    log_file_path: PathBuf,
}

impl ReportWriter {
    pub fn new(results_dir: impl Into<PathBuf>, log_file_path: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            log_file_path: log_file_path.into(),
        }
    }

    /// 追加单个会话的结果行
    pub async fn append_session(&self, record: &SessionRecord) -> Result<()> {
        debug!("写入会话记录: {}", record.session_id);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .await
            .with_context(|| format!("无法打开输出日志: {}", self.log_file_path.display()))?;

        file.write_all(session_line(record).as_bytes()).await?;
        Ok(())
    }

    /// 保存批量报告，返回写入的文件路径
    pub async fn save(&self, report: &BatchReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.results_dir)
            .await
            .with_context(|| format!("无法创建结果目录: {}", self.results_dir.display()))?;

        let path = report_path(&self.results_dir, &report.batch_id);
        let json = serde_json::to_string_pretty(report).context("序列化批量报告失败")?;
        fs::write(&path, json)
            .await
            .with_context(|| format!("无法写入报告: {}", path.display()))?;
        Ok(path)
    }
}

pub fn report_path(results_dir: &Path, batch_id: &str) -> PathBuf {
    results_dir.join(format!("batch_report_{batch_id}.json"))
}

fn session_line(record: &SessionRecord) -> String {
    let outcome = match record.outcome {
        Some(SessionOutcome::Completed) => "完成",
        Some(SessionOutcome::Failed) => "失败",
        Some(SessionOutcome::Aborted) => "中止",
        None => "未结束",
    };
    let failure = record
        .failure
        .as_ref()
        .map(|f| format!(" | {}: {}", f.kind, f.message))
        .unwrap_or_default();
    format!(
        "{} | 访问码 {} | {} | 页数 {} | 人工 {} | 重试 {} | {:.1}s{}\n",
        record.ended_at.unwrap_or(record.started_at).format("%H:%M:%S"),
        record.access_code,
        outcome,
        record.pages_visited,
        record.manual_interventions,
        record.retries,
        record.duration_secs(),
        failure
    )
}

//! 会话流程 - 流程层
//!
//! 核心职责：定义"一份问卷"的完整遍历流程
//!
//! 状态顺序：
//! 1. AWAITING_PAGE → IDENTIFYING
//! 2. IDENTIFYING → EXECUTING（精确 / 模糊匹配）或 MANUAL_REQUIRED（无匹配）
//! 3. EXECUTING / MANUAL_REQUIRED → ADVANCING → AWAITING_PAGE
//! 4. 结束页 → COMPLETED；致命错误 → FAILED

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::SessionError;
use crate::infrastructure::BrowserControl;
use crate::models::{
    ExecutionResult, FailureInfo, PageSignal, ScenarioStore, SessionOutcome, SessionRecord,
    StrategyDescriptor,
};
use crate::services::matcher::Candidate;
use crate::services::{
    suggest_action, ActionExecutor, MatchOutcome, MatrixMode, NavigationOutcome, Navigator,
    PageIdentifier, ScenarioMatcher, StrategyFactory,
};
use crate::utils::logging::truncate_text;
use crate::workflow::operator::{AbortSignal, ManualPrompt, ManualReason, OperatorChannel};
use crate::workflow::session_ctx::SessionCtx;

/// 会话状态
enum State<'s> {
    AwaitingPage,
    /// `retry > 0` 表示执行失败后对同一页面的重新识别
    Identifying { retry: u32 },
    Executing {
        signal: PageSignal,
        descriptor: &'s StrategyDescriptor,
        retry: u32,
    },
    ManualRequired {
        signal: PageSignal,
        reason: ManualReason,
        best_guess: Option<Candidate>,
        missing: Vec<String>,
    },
    /// `result` 为 `None` 表示操作员已经完成本页
    Advancing {
        signal: PageSignal,
        result: Option<ExecutionResult>,
    },
}

/// 会话级参数
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub max_pages: usize,
    pub loop_threshold: usize,
    pub execution_retries: u32,
    pub completion_markers: Vec<String>,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_pages: config.max_pages,
            loop_threshold: config.loop_threshold,
            execution_retries: config.execution_retries,
            completion_markers: config.survey.completion_markers.clone(),
        }
    }
}

/// 会话流程
///
/// - 编排单个问卷的完整遍历
/// - 不持有浏览器资源，只通过 `BrowserControl` 使用它
/// - 场景库只读，跨会话共享
pub struct SessionFlow {
    store: Arc<ScenarioStore>,
    identifier: PageIdentifier,
    matcher: ScenarioMatcher,
    executor: ActionExecutor,
    navigator: Navigator,
    settings: SessionSettings,
}

impl SessionFlow {
    pub fn new(config: &Config, store: Arc<ScenarioStore>) -> Self {
        let matrix_mode = if config.random_matrix {
            MatrixMode::Random {
                ratings: config.random_ratings.clone(),
            }
        } else {
            MatrixMode::Fixed
        };
        Self {
            store,
            identifier: PageIdentifier::new(config.timing.page_load_timeout()),
            matcher: ScenarioMatcher::new(config.fuzzy_threshold),
            executor: ActionExecutor::new(StrategyFactory::new(matrix_mode, config.random_seed)),
            navigator: Navigator::new(config.timing.recheck_bound, config.timing.recheck_interval()),
            settings: SessionSettings::from_config(config),
        }
    }

    /// 运行一个会话直到终态，返回已经结束的会话记录
    pub async fn run(
        &self,
        control: &dyn BrowserControl,
        ctx: &SessionCtx,
        operator: &dyn OperatorChannel,
        abort: &AbortSignal,
    ) -> SessionRecord {
        let mut record = SessionRecord::new(&ctx.session_id, &ctx.access_code);
        record.retries = ctx.attempt;

        match self.drive(control, ctx, operator, abort, &mut record).await {
            Ok(outcome) => {
                match outcome {
                    SessionOutcome::Completed => info!("{} ✅ 问卷完成，共 {} 页", ctx, record.pages_visited),
                    SessionOutcome::Aborted => warn!("{} ⏹ 会话已中止", ctx),
                    SessionOutcome::Failed => {}
                }
                record.finish(outcome, None);
            }
            Err(err) => {
                error!("{} ❌ 会话失败 ({}): {}", ctx, err.kind(), err);
                record.finish(SessionOutcome::Failed, Some(FailureInfo::from(&err)));
            }
        }
        record
    }

    async fn drive(
        &self,
        control: &dyn BrowserControl,
        ctx: &SessionCtx,
        operator: &dyn OperatorChannel,
        abort: &AbortSignal,
        record: &mut SessionRecord,
    ) -> Result<SessionOutcome, SessionError> {
        let mut state = State::AwaitingPage;
        let mut tracker = LoopTracker::new(self.settings.loop_threshold);
        // 最近一次点击过的前进按钮，防止同一页面被点击两次
        let mut last_forward: Option<String> = None;

        loop {
            state = match state {
                State::AwaitingPage => {
                    if abort.is_raised() {
                        return Ok(SessionOutcome::Aborted);
                    }
                    if record.pages_visited >= self.settings.max_pages {
                        return Err(SessionError::PageLimitExceeded(self.settings.max_pages));
                    }
                    State::Identifying { retry: 0 }
                }

                State::Identifying { retry } => {
                    let signal = self.identifier.identify(control).await?;
                    if retry == 0 {
                        record.pages_visited += 1;
                    }
                    info!(
                        "{} 📄 第 {} 页: {}",
                        ctx,
                        record.pages_visited,
                        truncate_text(&signal.describe(), 60)
                    );

                    if signal.is_terminal(&self.settings.completion_markers) {
                        return Ok(SessionOutcome::Completed);
                    }

                    match signal.raw_text.as_question().map(str::to_string) {
                        None => {
                            debug!("{} 无题干页面，直接翻页", ctx);
                            tracker.reset();
                            State::Advancing {
                                signal,
                                result: Some(ExecutionResult::new("cover")),
                            }
                        }
                        Some(raw_text) if retry == 0 && tracker.observe(&signal.detected_key) => {
                            warn!("{} ⚠️ 同一问题已连续出现 {} 次", ctx, tracker.threshold);
                            debug!("{} 重复页面: {}", ctx, raw_text);
                            State::ManualRequired {
                                signal,
                                reason: ManualReason::RepeatedPage,
                                best_guess: None,
                                missing: Vec::new(),
                            }
                        }
                        Some(raw_text) => self.route(ctx, signal, &raw_text, retry, record),
                    }
                }

                State::Executing {
                    signal,
                    descriptor,
                    retry,
                } => match self.executor.execute(control, descriptor, &ctx.profile).await {
                    Ok(result) => {
                        record.record_strategy(&result.strategy_id);
                        State::Advancing {
                            signal,
                            result: Some(result),
                        }
                    }
                    Err(err) if retry < self.settings.execution_retries => {
                        warn!(
                            "{} ⚠️ 执行失败，重新识别页面 ({}/{}): {}",
                            ctx,
                            retry + 1,
                            self.settings.execution_retries,
                            err
                        );
                        State::Identifying { retry: retry + 1 }
                    }
                    Err(err) => return Err(err.into()),
                },

                State::ManualRequired {
                    signal,
                    reason,
                    best_guess,
                    missing,
                } => {
                    record.manual_interventions += 1;
                    let prompt = ManualPrompt {
                        reason,
                        page_text: signal.describe(),
                        best_guess,
                        suggested_action: suggest_action(&signal),
                        missing,
                    };
                    operator.await_resume(ctx, &prompt).await?;
                    info!("{} ▶ 操作员已完成本页", ctx);
                    State::Advancing {
                        signal,
                        result: None,
                    }
                }

                State::Advancing { signal, result } => {
                    if let (Some(forward), Some(last)) = (&signal.forward, &last_forward) {
                        if &forward.id == last {
                            return Err(SessionError::DuplicateAdvance {
                                page: signal.describe(),
                            });
                        }
                    }

                    match self.navigator.advance(control, result.as_ref()).await? {
                        NavigationOutcome::Advanced => {
                            last_forward = signal.forward.as_ref().map(|c| c.id.clone());
                            State::AwaitingPage
                        }
                        NavigationOutcome::Withheld => State::ManualRequired {
                            missing: result.map(|r| r.missing).unwrap_or_default(),
                            signal,
                            reason: ManualReason::IncompleteFill,
                            best_guess: None,
                        },
                        NavigationOutcome::NoForwardControl => {
                            return Err(SessionError::ForwardMissing {
                                page: signal.describe(),
                            });
                        }
                    }
                }
            };
        }
    }

    /// 按匹配结果决定进入 EXECUTING 还是 MANUAL_REQUIRED
    fn route<'s>(
        &'s self,
        ctx: &SessionCtx,
        signal: PageSignal,
        raw_text: &str,
        retry: u32,
        record: &mut SessionRecord,
    ) -> State<'s> {
        match self.matcher.resolve(raw_text, &self.store) {
            MatchOutcome::Exact { key, descriptor } => {
                info!("{} ✓ 精确匹配 '{}' → {}", ctx, key, descriptor.action_type);
                State::Executing {
                    signal,
                    descriptor,
                    retry,
                }
            }
            MatchOutcome::Fuzzy {
                key,
                descriptor,
                score,
            } => {
                info!(
                    "{} ≈ 模糊匹配 '{}' (相似度 {:.2}) → {}",
                    ctx, key, score, descriptor.action_type
                );
                record.record_fuzzy(raw_text, &key, score);
                State::Executing {
                    signal,
                    descriptor,
                    retry,
                }
            }
            MatchOutcome::NoMatch { best_guess } => {
                let reason = if best_guess.is_some() {
                    ManualReason::LowConfidence
                } else {
                    ManualReason::NoMatch
                };
                State::ManualRequired {
                    signal,
                    reason,
                    best_guess,
                    missing: Vec::new(),
                }
            }
        }
    }
}

/// 连续出现同一问题键的计数
struct LoopTracker {
    threshold: usize,
    last_key: Option<String>,
    repeats: usize,
}

impl LoopTracker {
    fn new(threshold: usize) -> Self {
        Self {
            threshold,
            last_key: None,
            repeats: 0,
        }
    }

    fn reset(&mut self) {
        self.last_key = None;
        self.repeats = 0;
    }

    /// 记录一次页面访问；达到阈值时返回 `true` 并清零
    fn observe(&mut self, key: &Option<String>) -> bool {
        if key.is_some() && *key == self.last_key {
            self.repeats += 1;
        } else {
            self.last_key = key.clone();
            self.repeats = 1;
        }
        if self.repeats >= self.threshold {
            self.repeats = 0;
            return true;
        }
        false
    }
}

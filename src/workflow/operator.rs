//! 人工介入
//!
//! MANUAL_REQUIRED 状态唯一会阻塞的地方：等待操作员处理完页面后发出继续信号

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::error::SessionError;
use crate::models::ActionType;
use crate::services::matcher::Candidate;
use crate::workflow::session_ctx::SessionCtx;

/// 需要人工介入的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualReason {
    /// 场景库里没有任何候选
    NoMatch,
    /// 最佳候选低于阈值
    LowConfidence,
    /// 策略执行完但目标没有全部完成
    IncompleteFill,
    /// 同一问题连续出现
    RepeatedPage,
}

impl fmt::Display for ManualReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ManualReason::NoMatch => "未知页面",
            ManualReason::LowConfidence => "匹配置信度不足",
            ManualReason::IncompleteFill => "填写不完整",
            ManualReason::RepeatedPage => "页面重复出现",
        };
        f.write_str(text)
    }
}

/// 展示给操作员的提示
#[derive(Debug, Clone)]
pub struct ManualPrompt {
    pub reason: ManualReason,
    pub page_text: String,
    pub best_guess: Option<Candidate>,
    pub suggested_action: Option<ActionType>,
    pub missing: Vec<String>,
}

impl fmt::Display for ManualPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "⚠️ 需要人工处理: {}", self.reason)?;
        writeln!(f, "   页面: {}", self.page_text)?;
        if let Some(guess) = &self.best_guess {
            writeln!(f, "   最接近的场景: '{}' (相似度 {:.2})", guess.key, guess.score)?;
        }
        if let Some(action) = self.suggested_action {
            writeln!(f, "   建议动作: {}", action)?;
        }
        if !self.missing.is_empty() {
            writeln!(f, "   未完成: {}", self.missing.join(", "))?;
        }
        write!(f, "   请在浏览器中完成本页（不要点击下一页），然后按 ENTER 继续...")
    }
}

/// 操作员通道
#[async_trait]
pub trait OperatorChannel: Send + Sync {
    /// 阻塞直到操作员发出继续信号，没有超时
    async fn await_resume(&self, ctx: &SessionCtx, prompt: &ManualPrompt) -> Result<(), SessionError>;
}

/// 默认实现：打印提示，等待标准输入上的 ENTER
pub struct StdinOperator;

#[async_trait]
impl OperatorChannel for StdinOperator {
    async fn await_resume(&self, ctx: &SessionCtx, prompt: &ManualPrompt) -> Result<(), SessionError> {
        warn!("{} 等待人工处理: {}", ctx, prompt.reason);
        println!("\n{}\n{}", ctx, prompt);

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| SessionError::Operator(e.to_string()))?;
        if read == 0 {
            return Err(SessionError::Operator("标准输入已关闭".to_string()));
        }
        Ok(())
    }
}

/// 中止信号，只在等待新页面时检查
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_signal_is_shared() {
        let signal = AbortSignal::new();
        let clone = signal.clone();
        assert!(!signal.is_raised());
        clone.raise();
        assert!(signal.is_raised());
    }

    #[test]
    fn test_prompt_lists_best_guess() {
        let prompt = ManualPrompt {
            reason: ManualReason::LowConfidence,
            page_text: "Jak hodnotíte školu?".into(),
            best_guess: Some(Candidate {
                key: "jak hodnotíte třídu".into(),
                score: 0.71,
            }),
            suggested_action: Some(ActionType::MatrixFixed),
            missing: Vec::new(),
        };
        let text = prompt.to_string();
        assert!(text.contains("匹配置信度不足"));
        assert!(text.contains("0.71"));
        assert!(text.contains("matrix_fixed"));
    }
}

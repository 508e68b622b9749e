use async_trait::async_trait;
use tracing::warn;

use super::Strategy;
use crate::error::ControlError;
use crate::infrastructure::{BrowserControl, ControlKind};
use crate::models::ExecutionResult;

/// 按 label 文本选择单选项：第一个包含短语的选项胜出（区分大小写）
pub struct RadioByLabel {
    phrase: String,
}

impl RadioByLabel {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
        }
    }
}

#[async_trait]
impl Strategy for RadioByLabel {
    fn id(&self) -> &'static str {
        "radio_by_label"
    }

    async fn execute(&self, control: &dyn BrowserControl) -> Result<ExecutionResult, ControlError> {
        let radios = control.controls(ControlKind::Radio).await?;
        let mut result = ExecutionResult::new(self.id());
        result.attempted = 1;

        match radios.iter().find(|r| r.label.contains(&self.phrase)) {
            Some(target) if target.checked => result.already_satisfied = 1,
            Some(target) => {
                control.click(&target.id).await?;
                result.succeeded = 1;
                result.record_selection(&self.phrase);
            }
            None => {
                warn!(
                    "没有 label 包含 '{}' 的单选项 (共 {} 个)",
                    self.phrase,
                    radios.len()
                );
                result.missing.push(self.phrase.clone());
            }
        }

        Ok(result)
    }
}

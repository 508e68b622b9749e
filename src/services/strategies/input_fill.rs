use async_trait::async_trait;
use tracing::warn;

use super::Strategy;
use crate::error::ControlError;
use crate::infrastructure::{BrowserControl, ControlKind};
use crate::models::ExecutionResult;

/// 填写所有文本 / 数字输入框
///
/// 无条件覆盖已有内容；控制层负责触发 focus / input / change / blur，
/// 保证页面上的校验脚本能看到变化
pub struct InputFill {
    /// `None` 表示引用的用户资料字段没有值
    value: Option<String>,
    source: String,
}

impl InputFill {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            source: "literal".to_string(),
        }
    }

    /// 用户资料中缺少字段时使用，执行时把所有输入框记为未完成
    pub fn unresolved(field: impl Into<String>) -> Self {
        Self {
            value: None,
            source: format!("profile:{}", field.into()),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

#[async_trait]
impl Strategy for InputFill {
    fn id(&self) -> &'static str {
        "input_fill"
    }

    async fn execute(&self, control: &dyn BrowserControl) -> Result<ExecutionResult, ControlError> {
        let inputs = control.controls(ControlKind::TextInput).await?;
        let mut result = ExecutionResult::new(self.id());
        result.attempted = inputs.len();

        let Some(value) = self.value.as_deref() else {
            if !inputs.is_empty() {
                warn!("没有可填写的值 ({})", self.source);
                result.missing.push(self.source.clone());
            }
            return Ok(result);
        };

        for input in &inputs {
            control.set_value(&input.id, value).await?;
            result.succeeded += 1;
        }

        Ok(result)
    }
}

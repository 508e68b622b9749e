use async_trait::async_trait;
use tracing::warn;

use super::Strategy;
use crate::error::ControlError;
use crate::infrastructure::{BrowserControl, ControlKind};
use crate::models::ExecutionResult;

/// 按位置勾选复选框（位置从 1 开始，按页面出现顺序）
pub struct CheckboxByIndex {
    positions: Vec<usize>,
}

impl CheckboxByIndex {
    /// 重复的位置只保留第一次
    pub fn new(positions: &[usize]) -> Self {
        let mut unique = Vec::with_capacity(positions.len());
        for &p in positions {
            if !unique.contains(&p) {
                unique.push(p);
            }
        }
        Self { positions: unique }
    }
}

#[async_trait]
impl Strategy for CheckboxByIndex {
    fn id(&self) -> &'static str {
        "checkbox_by_index"
    }

    async fn execute(&self, control: &dyn BrowserControl) -> Result<ExecutionResult, ControlError> {
        let boxes = control.controls(ControlKind::Checkbox).await?;
        let mut result = ExecutionResult::new(self.id());
        result.attempted = self.positions.len();

        for &position in &self.positions {
            match position.checked_sub(1).and_then(|i| boxes.get(i)) {
                Some(target) if target.checked => result.already_satisfied += 1,
                Some(target) => {
                    control.click(&target.id).await?;
                    result.succeeded += 1;
                }
                None => {
                    warn!("复选框位置 {} 不存在 (共 {} 个)", position, boxes.len());
                    result.missing.push(format!("#{position}"));
                }
            }
        }

        Ok(result)
    }
}

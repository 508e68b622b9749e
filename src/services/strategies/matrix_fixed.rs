use async_trait::async_trait;
use tracing::debug;

use super::{group_rows, Strategy};
use crate::error::ControlError;
use crate::infrastructure::{BrowserControl, ControlKind};
use crate::models::ExecutionResult;

/// 矩阵题固定评分：每一行都选择同一个选项
pub struct MatrixFixed {
    rating: String,
}

impl MatrixFixed {
    pub fn new(rating: impl Into<String>) -> Self {
        Self {
            rating: rating.into(),
        }
    }
}

#[async_trait]
impl Strategy for MatrixFixed {
    fn id(&self) -> &'static str {
        "matrix_fixed"
    }

    async fn execute(&self, control: &dyn BrowserControl) -> Result<ExecutionResult, ControlError> {
        let rows = group_rows(control.controls(ControlKind::Radio).await?);
        let mut result = ExecutionResult::new(self.id());
        result.attempted = rows.len();

        for row in &rows {
            match row.option(&self.rating) {
                Some(option) if option.checked => {
                    result.already_satisfied += 1;
                }
                Some(option) => {
                    control.click(&option.id).await?;
                    result.succeeded += 1;
                    result.record_selection(&self.rating);
                }
                None => {
                    debug!("行 {} 没有选项 {}", row.group, self.rating);
                    result.missing.push(row.group.clone());
                }
            }
        }

        Ok(result)
    }
}

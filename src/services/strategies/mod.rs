//! 填写策略库
//!
//! 每个策略都遵守同一个约定：
//! - `execute(控制层) → ExecutionResult`
//! - "没有需要做的事" 不是错误，返回计数为 0 的结果
//! - 只有控制层本身出错时才返回 `Err`

pub mod barrier_free;
pub mod checkbox;
pub mod factory;
pub mod input_fill;
pub mod matrix_fixed;
pub mod matrix_random;
pub mod radio;

use async_trait::async_trait;

use crate::error::ControlError;
use crate::infrastructure::{BrowserControl, Control};
use crate::models::ExecutionResult;

pub use barrier_free::{classify_rows, BarrierFree, RowClass};
pub use checkbox::CheckboxByIndex;
pub use factory::{MatrixMode, StrategyFactory};
pub use input_fill::InputFill;
pub use matrix_fixed::MatrixFixed;
pub use matrix_random::MatrixRandom;
pub use radio::RadioByLabel;

/// 可执行的填写策略
#[async_trait]
pub trait Strategy: Send + Sync {
    fn id(&self) -> &'static str;

    async fn execute(&self, control: &dyn BrowserControl) -> Result<ExecutionResult, ControlError>;
}

/// 不需要填写的页面（说明页、最终提交页）
pub struct Skip;

#[async_trait]
impl Strategy for Skip {
    fn id(&self) -> &'static str {
        "skip"
    }

    async fn execute(&self, _control: &dyn BrowserControl) -> Result<ExecutionResult, ControlError> {
        Ok(ExecutionResult::new(self.id()))
    }
}

/// 矩阵题的一行：共享同一个行标识的单选按钮
#[derive(Debug, Clone)]
pub struct MatrixRow {
    pub group: String,
    pub text: String,
    pub options: Vec<Control>,
}

impl MatrixRow {
    pub fn option(&self, code: &str) -> Option<&Control> {
        self.options
            .iter()
            .find(|c| c.option_code().as_deref() == Some(code))
    }

    pub fn has_selection(&self) -> bool {
        self.options.iter().any(|c| c.checked)
    }

    pub fn option_codes(&self) -> Vec<String> {
        self.options.iter().filter_map(Control::option_code).collect()
    }
}

/// 按行标识分组，保持页面上的出现顺序；没有行标识的单选按钮被忽略
pub fn group_rows(radios: Vec<Control>) -> Vec<MatrixRow> {
    let mut rows: Vec<MatrixRow> = Vec::new();
    for radio in radios {
        let Some(group) = radio.row_group() else {
            continue;
        };
        match rows.iter_mut().find(|row| row.group == group) {
            Some(row) => {
                if row.text.is_empty() {
                    row.text = radio.row_text.clone();
                }
                row.options.push(radio);
            }
            None => rows.push(MatrixRow {
                group,
                text: radio.row_text.clone(),
                options: vec![radio],
            }),
        }
    }
    rows
}

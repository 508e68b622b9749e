//! 无障碍例外策略
//!
//! 先给每一行分类，全部分类完成之后才开始点击：
//! 命中关键词的行选"非常不同意"，其余行选"同意"。

use async_trait::async_trait;
use tracing::{debug, info};

use super::{group_rows, MatrixRow, Strategy};
use crate::error::ControlError;
use crate::infrastructure::{BrowserControl, ControlKind};
use crate::models::ExecutionResult;

pub const DEFAULT_BARRIER_RATING: &str = "A1";
pub const DEFAULT_AGREE_RATING: &str = "A6";

/// 行分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Barrier,
    Default,
}

/// 按关键词（不区分大小写）给所有行分类
pub fn classify_rows(rows: &[MatrixRow], keywords: &[String]) -> Vec<RowClass> {
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
    rows.iter()
        .map(|row| {
            let text = row_text(row).to_lowercase();
            if keywords.iter().any(|k| text.contains(k.as_str())) {
                RowClass::Barrier
            } else {
                RowClass::Default
            }
        })
        .collect()
}

/// 行文本缺失时退回到各选项的 label
fn row_text(row: &MatrixRow) -> String {
    if !row.text.is_empty() {
        return row.text.clone();
    }
    row.options
        .iter()
        .map(|c| c.label.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct BarrierFree {
    keywords: Vec<String>,
    barrier_rating: String,
    default_rating: String,
}

impl BarrierFree {
    pub fn new(
        keywords: Vec<String>,
        barrier_rating: Option<String>,
        default_rating: Option<String>,
    ) -> Self {
        Self {
            keywords,
            barrier_rating: barrier_rating.unwrap_or_else(|| DEFAULT_BARRIER_RATING.to_string()),
            default_rating: default_rating.unwrap_or_else(|| DEFAULT_AGREE_RATING.to_string()),
        }
    }
}

#[async_trait]
impl Strategy for BarrierFree {
    fn id(&self) -> &'static str {
        "barrier_free"
    }

    async fn execute(&self, control: &dyn BrowserControl) -> Result<ExecutionResult, ControlError> {
        let rows = group_rows(control.controls(ControlKind::Radio).await?);
        let classes = classify_rows(&rows, &self.keywords);

        let barrier_count = classes.iter().filter(|c| **c == RowClass::Barrier).count();
        info!(
            "无障碍分类完成: {} 行命中关键词, {} 行默认",
            barrier_count,
            rows.len() - barrier_count
        );

        let mut result = ExecutionResult::new(self.id());
        result.attempted = rows.len();

        for (row, class) in rows.iter().zip(classes) {
            let rating = match class {
                RowClass::Barrier => &self.barrier_rating,
                RowClass::Default => &self.default_rating,
            };
            match row.option(rating) {
                Some(option) if option.checked => result.already_satisfied += 1,
                Some(option) => {
                    control.click(&option.id).await?;
                    result.succeeded += 1;
                    result.record_selection(rating);
                }
                None => {
                    debug!("行 {} 没有选项 {}", row.group, rating);
                    result.missing.push(row.group.clone());
                }
            }
        }

        Ok(result)
    }
}

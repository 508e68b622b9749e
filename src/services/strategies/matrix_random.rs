use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use tracing::debug;

use super::{group_rows, Strategy};
use crate::error::ControlError;
use crate::infrastructure::{BrowserControl, ControlKind};
use crate::models::ExecutionResult;

/// 矩阵题随机评分
///
/// 每一行独立地从候选评分中均匀抽取一个；已经有选择的行视为已满足
pub struct MatrixRandom {
    ratings: Vec<String>,
    rng: Mutex<StdRng>,
}

impl MatrixRandom {
    pub fn new(ratings: Vec<String>) -> Self {
        Self::with_rng(ratings, StdRng::from_os_rng())
    }

    pub fn with_rng(ratings: Vec<String>, rng: StdRng) -> Self {
        Self {
            ratings,
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl Strategy for MatrixRandom {
    fn id(&self) -> &'static str {
        "matrix_random"
    }

    async fn execute(&self, control: &dyn BrowserControl) -> Result<ExecutionResult, ControlError> {
        let rows = group_rows(control.controls(ControlKind::Radio).await?);
        let mut result = ExecutionResult::new(self.id());
        result.attempted = rows.len();

        // 先抽签，再点击：锁不会跨越 await
        let mut processed: HashSet<&str> = HashSet::new();
        let mut plan = Vec::new();
        {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| ControlError::Unavailable("随机数生成器不可用".to_string()))?;

            for row in &rows {
                if !processed.insert(row.group.as_str()) {
                    continue;
                }
                if row.has_selection() {
                    result.already_satisfied += 1;
                    continue;
                }
                let offered = row.option_codes();
                let allowed: Vec<&String> =
                    self.ratings.iter().filter(|r| offered.contains(r)).collect();
                match allowed.choose(&mut *rng) {
                    Some(rating) => {
                        if let Some(option) = row.option(rating) {
                            plan.push((option.id.clone(), (*rating).clone()));
                        }
                    }
                    None => {
                        debug!("行 {} 不提供任何候选评分 {:?}", row.group, self.ratings);
                        result.missing.push(row.group.clone());
                    }
                }
            }
        }

        for (control_id, rating) in plan {
            control.click(&control_id).await?;
            result.succeeded += 1;
            result.record_selection(&rating);
        }

        Ok(result)
    }
}

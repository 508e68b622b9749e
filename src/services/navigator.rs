//! 翻页服务 - 业务能力层
//!
//! 只负责"点前进并确认页面真的换了"

use std::time::Duration;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::infrastructure::BrowserControl;
use crate::models::ExecutionResult;

/// 一次翻页尝试的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// 前进按钮已点击，页面已变化
    Advanced,
    /// 填写结果未成功，没有点击
    Withheld,
    /// 页面上没有前进按钮，没有点击
    NoForwardControl,
}

/// 翻页服务
pub struct Navigator {
    recheck_bound: u32,
    recheck_interval: Duration,
}

impl Navigator {
    pub fn new(recheck_bound: u32, recheck_interval: Duration) -> Self {
        Self {
            recheck_bound,
            recheck_interval,
        }
    }

    pub fn recheck_bound(&self) -> u32 {
        self.recheck_bound
    }

    /// 尝试翻页
    ///
    /// `result` 为 `None` 表示这一页由操作员完成，视为成功。
    /// 点击之后最多检查 `recheck_bound` 次；前进按钮消失或 id 变化即认为已翻页
    pub async fn advance(
        &self,
        control: &dyn BrowserControl,
        result: Option<&ExecutionResult>,
    ) -> Result<NavigationOutcome, SessionError> {
        if let Some(result) = result {
            if !result.is_success() {
                debug!("填写未完成，暂不翻页: {}", result.summary());
                return Ok(NavigationOutcome::Withheld);
            }
        }

        let Some(forward) = control.forward_control().await? else {
            return Ok(NavigationOutcome::NoForwardControl);
        };

        control.click(&forward.id).await?;

        for attempt in 1..=self.recheck_bound {
            control.settle(self.recheck_interval).await;
            match control.forward_control().await? {
                None => return Ok(NavigationOutcome::Advanced),
                Some(current) if current.id != forward.id => {
                    debug!("第 {} 次检查确认页面已变化", attempt);
                    return Ok(NavigationOutcome::Advanced);
                }
                Some(_) => {}
            }
        }

        warn!("点击前进后页面 {} 次检查均未变化", self.recheck_bound);
        Err(SessionError::NavigationStalled {
            rechecks: self.recheck_bound,
        })
    }
}

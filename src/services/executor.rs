//! 动作执行服务 - 业务能力层

use tracing::{info, warn};

use crate::error::ControlError;
use crate::infrastructure::BrowserControl;
use crate::models::{ExecutionResult, StrategyDescriptor, UserProfile};
use crate::services::strategies::StrategyFactory;

/// 动作执行服务
///
/// 把描述符交给工厂构建策略并运行，只记录日志，不决定是否翻页
pub struct ActionExecutor {
    factory: StrategyFactory,
}

impl ActionExecutor {
    pub fn new(factory: StrategyFactory) -> Self {
        Self { factory }
    }

    pub async fn execute(
        &self,
        control: &dyn BrowserControl,
        descriptor: &StrategyDescriptor,
        profile: &UserProfile,
    ) -> Result<ExecutionResult, ControlError> {
        let strategy = self.factory.build(descriptor, profile);
        let result = strategy.execute(control).await?;

        if result.is_partial_failure() {
            warn!("⚠️ {} | 未找到: {:?}", result.summary(), result.missing);
        } else {
            info!("✓ {}", result.summary());
        }
        Ok(result)
    }
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self::new(StrategyFactory::default())
    }
}

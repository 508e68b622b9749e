//! 单个访问码的执行器 - 编排层
//!
//! 打开上下文 → 跑完一个会话 → 关闭上下文；瞬时失败时换新上下文重试

use std::sync::Arc;
use tracing::{info, warn};

use crate::infrastructure::ContextFactory;
use crate::models::{FailureInfo, SessionOutcome, SessionRecord};
use crate::error::SessionError;
use crate::workflow::{AbortSignal, OperatorChannel, SessionCtx, SessionFlow};

pub struct SessionRunner {
    flow: SessionFlow,
    factory: Arc<dyn ContextFactory>,
    operator: Arc<dyn OperatorChannel>,
    abort: AbortSignal,
    retry_bound: u32,
}

impl SessionRunner {
    pub fn new(
        flow: SessionFlow,
        factory: Arc<dyn ContextFactory>,
        operator: Arc<dyn OperatorChannel>,
        abort: AbortSignal,
        retry_bound: u32,
    ) -> Self {
        Self {
            flow,
            factory,
            operator,
            abort,
            retry_bound,
        }
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    /// 处理一个访问码，返回最后一次尝试的记录（`retries` 为额外尝试次数）
    pub async fn run(&self, ctx: SessionCtx) -> SessionRecord {
        let mut ctx = ctx;
        loop {
            let record = self.attempt(&ctx).await;
            if !self.should_retry(&ctx, &record) {
                return record;
            }
            warn!(
                "{} 🔄 瞬时失败，使用新的上下文重试 ({}/{})",
                ctx,
                ctx.attempt + 1,
                self.retry_bound
            );
            ctx = ctx.retry();
        }
    }

    /// 只有瞬时失败、没有人工介入、且还有重试额度时才重试
    fn should_retry(&self, ctx: &SessionCtx, record: &SessionRecord) -> bool {
        record.outcome == Some(SessionOutcome::Failed)
            && record.failure_kind().is_some_and(|kind| kind.is_transient())
            && record.manual_interventions == 0
            && ctx.attempt < self.retry_bound
            && !self.abort.is_raised()
    }

    async fn attempt(&self, ctx: &SessionCtx) -> SessionRecord {
        info!("{} 🌐 打开新的浏览器上下文", ctx);
        let mut context = match self.factory.open(&ctx.access_code).await {
            Ok(context) => context,
            Err(err) => {
                let err = SessionError::from(err);
                warn!("{} ❌ 上下文创建失败: {}", ctx, err);
                let mut record = SessionRecord::new(&ctx.session_id, &ctx.access_code);
                record.retries = ctx.attempt;
                record.finish(SessionOutcome::Failed, Some(FailureInfo::from(&err)));
                return record;
            }
        };

        let record = self
            .flow
            .run(context.control(), ctx, self.operator.as_ref(), &self.abort)
            .await;

        if let Err(err) = context.close().await {
            warn!("{} 关闭上下文失败: {}", ctx, err);
        }
        record
    }
}

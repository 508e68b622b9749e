pub mod operator;
pub mod session_ctx;
pub mod session_flow;

pub use operator::{AbortSignal, ManualPrompt, ManualReason, OperatorChannel, StdinOperator};
pub use session_ctx::SessionCtx;
pub use session_flow::{SessionFlow, SessionSettings};

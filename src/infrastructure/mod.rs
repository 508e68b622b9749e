//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（浏览器 / Page），只暴露能力

pub mod cdp_control;
pub mod control;
pub mod js_executor;

pub use cdp_control::{CdpControl, SelectorSet};
pub use control::{BrowserControl, Control, ControlContext, ControlKind, ContextFactory, RegionRole};
pub use js_executor::JsExecutor;

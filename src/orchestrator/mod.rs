//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和重试调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量处理器
//! - 管理应用生命周期（初始化、运行、写报告）
//! - 顺序处理访问码，会话之间等待固定间隔
//! - 中止信号到来后不再开始新的会话
//! - 输出全局统计信息
//!
//! ### `session_runner` - 单个访问码执行器
//! - 为每次尝试打开并关闭独立的浏览器上下文
//! - 瞬时失败且无人工介入时重试
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<访问码>)
//!     ↓
//! session_runner (处理单个访问码 + 重试)
//!     ↓
//! workflow::SessionFlow (遍历一份问卷)
//!     ↓
//! services (能力层：识别 / 匹配 / 执行 / 翻页)
//!     ↓
//! infrastructure (基础设施：BrowserControl)
//! ```

pub mod batch_processor;
pub mod session_runner;

// 重新导出主要类型
pub use batch_processor::{App, BatchProcessor};
pub use session_runner::SessionRunner;

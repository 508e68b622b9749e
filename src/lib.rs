//! # Survey Autofill
//!
//! 自动填写多页问卷的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `BrowserControl` - 读区域文本、枚举控件、点击、赋值
//! - `CdpControl` / `JsExecutor` - 基于 chromiumoxide 的实现
//! - `browser/` - 启动干净的浏览器并完成登录
//!
//! ### ② 数据层（Models）
//! - `models/` - 场景库、页面信号、执行结果、会话记录、批量报告
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能对一个页面做什么"
//! - `normalize` / `ScenarioMatcher` - 页面文本 → 策略
//! - `strategies` - 矩阵 / 复选框 / 单选 / 输入框 / 无障碍
//! - `PageIdentifier` / `Navigator` - 识别页面、翻页确认
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一份问卷"的完整遍历流程
//! - `SessionFlow` - 状态机（识别 → 执行 / 人工 → 翻页）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 顺序处理所有访问码，汇总报告
//! - `orchestrator/session_runner` - 单个访问码的上下文与重试
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, ControlError, FailureKind, SessionError};
pub use infrastructure::{BrowserControl, Control, ContextFactory, ControlContext, ControlKind};
pub use models::{BatchReport, ScenarioStore, SessionOutcome, SessionRecord};
pub use orchestrator::{App, BatchProcessor, SessionRunner};
pub use workflow::{AbortSignal, OperatorChannel, SessionCtx, SessionFlow};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 场景库错误
    #[error("场景库错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 浏览器控制层错误
    #[error("浏览器错误: {0}")]
    Control(#[from] ControlError),
    /// 访问码文件读取失败
    #[error("无法读取访问码文件 ({path}): {source}")]
    CodesFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 浏览器控制层错误
///
/// 只表示"控制层本身出了问题"，策略层面的"没找到目标"不属于这里
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ControlError {
    /// 浏览器不可达 / 脚本执行失败
    #[error("浏览器控制层不可用: {0}")]
    Unavailable(String),
    /// 控件在枚举之后消失
    #[error("控件已失效: {0}")]
    StaleControl(String),
    /// 有界等待超时
    #[error("等待超时: {what} ({timeout_ms}ms)")]
    Timeout { what: String, timeout_ms: u64 },
    /// 脚本返回的数据无法解析
    #[error("脚本返回格式无效: {0}")]
    InvalidResponse(String),
    /// 打开会话上下文失败（启动浏览器 / 登录）
    #[error("会话上下文创建失败: {0}")]
    ContextSetup(String),
}

/// 会话级致命错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Control(#[from] ControlError),
    /// 点击前进按钮后页面一直没有变化
    #[error("翻页停滞: 点击后复查 {rechecks} 次页面均未变化")]
    NavigationStalled { rechecks: u32 },
    /// 有问题的页面却找不到前进按钮
    #[error("页面缺少前进按钮: {page}")]
    ForwardMissing { page: String },
    /// 超过单次会话的页面上限
    #[error("超过页面上限: {0}")]
    PageLimitExceeded(usize),
    /// 同一页面在没有重新识别的情况下被第二次点击前进
    #[error("同一页面重复点击前进按钮: {page}")]
    DuplicateAdvance { page: String },
    /// 操作员通道失败
    #[error("操作员通道失败: {0}")]
    Operator(String),
}

impl SessionError {
    /// 错误归类，用于批量报告和重试判断
    pub fn kind(&self) -> FailureKind {
        match self {
            SessionError::Control(ControlError::ContextSetup(_)) => FailureKind::ContextSetup,
            SessionError::Control(_) => FailureKind::ControlUnavailable,
            SessionError::NavigationStalled { .. } => FailureKind::NavigationStalled,
            SessionError::ForwardMissing { .. } => FailureKind::ForwardMissing,
            SessionError::PageLimitExceeded(_) => FailureKind::PageLimitExceeded,
            SessionError::DuplicateAdvance { .. } => FailureKind::NavigationStalled,
            SessionError::Operator(_) => FailureKind::OperatorChannel,
        }
    }
}

/// 会话失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ControlUnavailable,
    NavigationStalled,
    ForwardMissing,
    ContextSetup,
    PageLimitExceeded,
    OperatorChannel,
}

impl FailureKind {
    /// 是否属于瞬时错误（批量层可以用新的上下文重试）
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureKind::ControlUnavailable
                | FailureKind::NavigationStalled
                | FailureKind::ForwardMissing
                | FailureKind::ContextSetup
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ControlUnavailable => "ControlUnavailable",
            FailureKind::NavigationStalled => "NavigationStalled",
            FailureKind::ForwardMissing => "ForwardMissing",
            FailureKind::ContextSetup => "ContextSetup",
            FailureKind::PageLimitExceeded => "PageLimitExceeded",
            FailureKind::OperatorChannel => "OperatorChannel",
        };
        f.write_str(name)
    }
}

/// 场景库加载 / 校验错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取文件失败
    #[error("读取场景文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 解析失败
    #[error("解析场景文件失败 ({path}): {message}")]
    ParseFailed { path: String, message: String },
    /// 规范化之后出现重复的问题键
    #[error("重复的问题键: '{key}'")]
    DuplicateKey { key: String },
    /// 规范化之后问题键为空
    #[error("问题文本规范化后为空: '{question}'")]
    EmptyKey { question: String },
    /// 参数与动作类型不匹配
    #[error("场景 '{question}' 的 {action} 参数无效: {reason}")]
    InvalidParameters {
        question: String,
        action: String,
        reason: String,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取 / 解析失败
    #[error("配置文件 {path} 无效: {message}")]
    FileInvalid { path: String, message: String },
    /// 取值超出允许范围
    #[error("配置项 {field} 取值无效: {reason}")]
    OutOfRange { field: String, reason: String },
}

impl From<chromiumoxide::error::CdpError> for ControlError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ControlError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ControlError {
    fn from(err: serde_json::Error) -> Self {
        ControlError::InvalidResponse(err.to_string())
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

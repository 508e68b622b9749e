//! 浏览器控制能力 - 基础设施层
//!
//! 核心只依赖这里定义的抽象能力，不关心背后是 CDP、WebDriver 还是测试替身

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// 页面区域角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRole {
    /// 当前页的题干区域
    QuestionText,
    /// 整个页面正文
    Body,
}

/// 控件语义类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Radio,
    Checkbox,
    TextInput,
    /// 前进 / 提交按钮
    Forward,
}

/// 页面上的一个可操作控件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    /// 控制层分配的句柄，页面变化后必然不同
    pub id: String,
    pub kind: ControlKind,
    /// DOM 上的 id 属性
    #[serde(default)]
    pub dom_id: String,
    /// name 属性（矩阵题中同一行共享）
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    /// 关联的 label 文本
    #[serde(default)]
    pub label: String,
    /// 所在矩阵行的文本
    #[serde(default)]
    pub row_text: String,
    #[serde(default)]
    pub checked: bool,
}

fn option_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+)-(A\d+)$").expect("静态正则"))
}

impl Control {
    pub fn new(id: impl Into<String>, kind: ControlKind) -> Self {
        Self {
            id: id.into(),
            kind,
            dom_id: String::new(),
            name: String::new(),
            value: String::new(),
            label: String::new(),
            row_text: String::new(),
            checked: false,
        }
    }

    /// 矩阵行标识：优先 name，其次 DOM id 中 `-A<n>` 之前的部分
    pub fn row_group(&self) -> Option<String> {
        if !self.name.is_empty() {
            return Some(self.name.clone());
        }
        option_suffix()
            .captures(&self.dom_id)
            .map(|caps| caps[1].to_string())
    }

    /// 选项代码：DOM id 末尾的 `A<n>`，否则取 value
    pub fn option_code(&self) -> Option<String> {
        if let Some(caps) = option_suffix().captures(&self.dom_id) {
            return Some(caps[2].to_string());
        }
        if self.value.is_empty() {
            None
        } else {
            Some(self.value.clone())
        }
    }
}

/// 浏览器控制能力
///
/// 所有等待都是有界的，超时以 `ControlError::Timeout` 返回
#[async_trait]
pub trait BrowserControl: Send + Sync {
    /// 读取区域文本，区域不存在时返回 `None`
    async fn region_text(&self, role: RegionRole) -> Result<Option<String>, ControlError>;

    /// 按语义类型枚举控件（按页面出现顺序）
    async fn controls(&self, kind: ControlKind) -> Result<Vec<Control>, ControlError>;

    /// 当前页面的前进按钮
    async fn forward_control(&self) -> Result<Option<Control>, ControlError>;

    async fn click(&self, control_id: &str) -> Result<(), ControlError>;

    /// 清空并写入值，同时触发 focus / input / change / blur
    async fn set_value(&self, control_id: &str, value: &str) -> Result<(), ControlError>;

    /// 等待页面加载完成
    async fn wait_ready(&self, timeout: Duration) -> Result<(), ControlError>;

    /// 等待一段固定时间（测试替身可以直接返回）
    async fn settle(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 一次会话独占的控制上下文
#[async_trait]
pub trait ControlContext: Send + Sync {
    fn control(&self) -> &dyn BrowserControl;

    /// 关闭上下文，释放浏览器资源
    async fn close(&mut self) -> Result<(), ControlError>;
}

/// 为每个访问码创建全新、隔离的控制上下文
#[async_trait]
pub trait ContextFactory: Send + Sync {
    async fn open(&self, access_code: &str) -> Result<Box<dyn ControlContext>, ControlError>;
}

//! 单次页面访问的识别结果

use crate::infrastructure::Control;

/// 题干文本；没有题干区域的页面（封面 / 结束页）使用独立的哨兵值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageText {
    Question(String),
    NoQuestion,
}

impl PageText {
    pub fn as_question(&self) -> Option<&str> {
        match self {
            PageText::Question(text) => Some(text),
            PageText::NoQuestion => None,
        }
    }
}

/// 页面信号，每次访问页面时新建，用完即弃
#[derive(Debug, Clone)]
pub struct PageSignal {
    pub raw_text: PageText,
    /// 规范化后的问题键（无题干时为 `None`）
    pub detected_key: Option<String>,
    /// 页面上的单选 / 多选 / 输入控件
    pub candidate_controls: Vec<Control>,
    pub forward: Option<Control>,
    pub body_text: String,
}

impl PageSignal {
    /// 终止页：没有题干，并且出现完成标记或者没有前进按钮
    pub fn is_terminal(&self, completion_markers: &[String]) -> bool {
        if self.raw_text != PageText::NoQuestion {
            return false;
        }
        if self.forward.is_none() {
            return true;
        }
        let body = self.body_text.to_lowercase();
        completion_markers
            .iter()
            .any(|marker| body.contains(&marker.to_lowercase()))
    }

    /// 日志 / 人工提示用的页面描述
    pub fn describe(&self) -> String {
        match &self.raw_text {
            PageText::Question(text) => text.clone(),
            PageText::NoQuestion => "<无题干页面>".to_string(),
        }
    }
}

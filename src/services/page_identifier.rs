//! 页面识别服务 - 业务能力层
//!
//! 只负责"看清当前页面"，不做任何点击

use std::time::Duration;
use tracing::debug;

use crate::error::ControlError;
use crate::infrastructure::{BrowserControl, ControlKind, RegionRole};
use crate::models::{ActionType, PageSignal, PageText};
use crate::services::normalizer::normalize;

/// 页面识别服务
///
/// 每次调用都生成一个全新的 [`PageSignal`]，不缓存上一页的任何东西
pub struct PageIdentifier {
    ready_timeout: Duration,
}

impl PageIdentifier {
    pub fn new(ready_timeout: Duration) -> Self {
        Self { ready_timeout }
    }

    /// 识别当前页面
    ///
    /// 题干区域缺失或者只有空白时返回 `PageText::NoQuestion`
    pub async fn identify(&self, control: &dyn BrowserControl) -> Result<PageSignal, ControlError> {
        control.wait_ready(self.ready_timeout).await?;

        let raw_text = match control.region_text(RegionRole::QuestionText).await? {
            Some(text) if !text.trim().is_empty() => PageText::Question(text),
            _ => PageText::NoQuestion,
        };
        let detected_key = raw_text
            .as_question()
            .map(normalize)
            .filter(|key| !key.is_empty());

        let mut candidate_controls = Vec::new();
        for kind in [ControlKind::Radio, ControlKind::Checkbox, ControlKind::TextInput] {
            candidate_controls.extend(control.controls(kind).await?);
        }

        let forward = control.forward_control().await?;
        let body_text = control
            .region_text(RegionRole::Body)
            .await?
            .unwrap_or_default();

        debug!(
            "页面识别: 键={:?}, 控件 {} 个, 前进按钮 {}",
            detected_key,
            candidate_controls.len(),
            if forward.is_some() { "存在" } else { "缺失" }
        );

        Ok(PageSignal {
            raw_text,
            detected_key,
            candidate_controls,
            forward,
            body_text,
        })
    }
}

/// 根据页面上的控件猜一个动作类型，只用于人工提示
pub fn suggest_action(signal: &PageSignal) -> Option<ActionType> {
    let count = |kind: ControlKind| {
        signal
            .candidate_controls
            .iter()
            .filter(|c| c.kind == kind)
            .count()
    };
    let radios = count(ControlKind::Radio);
    let checkboxes = count(ControlKind::Checkbox);
    let inputs = count(ControlKind::TextInput);

    if inputs > 0 && radios == 0 && checkboxes == 0 {
        return Some(ActionType::InputFill);
    }
    if checkboxes > 0 && radios == 0 {
        return Some(ActionType::CheckboxByIndex);
    }
    if radios > 0 {
        let groups: std::collections::HashSet<String> = signal
            .candidate_controls
            .iter()
            .filter(|c| c.kind == ControlKind::Radio)
            .filter_map(|c| c.row_group())
            .collect();
        return Some(if groups.len() > 1 {
            ActionType::MatrixFixed
        } else {
            ActionType::RadioByLabel
        });
    }
    if signal.candidate_controls.is_empty() && signal.forward.is_some() {
        return Some(ActionType::Skip);
    }
    None
}

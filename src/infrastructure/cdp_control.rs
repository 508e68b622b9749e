//! 基于 CDP 的浏览器控制实现
//!
//! 通过注入 JS 完成枚举、点击和赋值。每个被枚举到的元素都会打上
//! `data-sa-id` 标记，标记里带有每页唯一的随机前缀，因此翻页之后
//! 同一个位置的按钮会得到不同的句柄。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ControlError;
use crate::infrastructure::control::{BrowserControl, Control, ControlKind, RegionRole};
use crate::infrastructure::JsExecutor;

const STAMP_PRELUDE: &str = r#"
    const nonce = window.__saNonce || (window.__saNonce = Math.random().toString(36).slice(2));
    window.__saSeq = window.__saSeq || 0;
    const stamp = (el) => {
        if (!el.dataset.saId) {
            window.__saSeq += 1;
            el.dataset.saId = nonce + '-' + window.__saSeq;
        }
        return el.dataset.saId;
    };
    const visible = (el) => !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length);
    const labelOf = (el) => {
        if (el.id) {
            const l = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
            if (l) return l.textContent.trim();
        }
        const p = el.closest('label');
        return p ? p.textContent.trim() : '';
    };
    const rowOf = (el) => {
        const r = el.closest('tr') || el.closest('.question-row');
        return r ? r.textContent.replace(/\s+/g, ' ').trim() : '';
    };
    const describe = (el, kind) => ({
        id: stamp(el),
        kind: kind,
        dom_id: el.id || '',
        name: el.name || '',
        value: el.value || '',
        label: labelOf(el),
        row_text: rowOf(el),
        checked: !!el.checked,
    });
"#;

const ENUMERATE_TEMPLATE: &str = r#"
(() => {
    __PRELUDE__
    return Array.from(document.querySelectorAll(__SELECTOR__))
        .filter((el) => !el.disabled)
        .map((el) => describe(el, __KIND__));
})()
"#;

const FORWARD_TEMPLATE: &str = r#"
(() => {
    __PRELUDE__
    for (const sel of __SELECTORS__) {
        const el = document.querySelector(sel);
        if (el && visible(el) && !el.disabled) {
            return { control: describe(el, 'forward') };
        }
    }
    return { control: null };
})()
"#;

const CLICK_TEMPLATE: &str = r#"
(() => {
    const el = document.querySelector('[data-sa-id="' + __ID__ + '"]');
    if (!el) return false;
    el.click();
    return true;
})()
"#;

const SET_VALUE_TEMPLATE: &str = r#"
(() => {
    const el = document.querySelector('[data-sa-id="' + __ID__ + '"]');
    if (!el) return false;
    const fire = (type) => el.dispatchEvent(new Event(type, { bubbles: true }));
    el.focus();
    fire('focus');
    el.value = '';
    fire('input');
    el.value = __VALUE__;
    fire('input');
    fire('change');
    el.blur();
    fire('blur');
    return true;
})()
"#;

const REGION_TEMPLATE: &str = r#"
(() => {
    const el = document.querySelector(__SELECTOR__);
    if (!el) return { text: null };
    return { text: el.innerText || el.textContent || '' };
})()
"#;

/// 可能为空的脚本返回值都包一层对象，避免 `null` 结果被当成"没有返回值"
#[derive(Debug, Deserialize)]
struct RegionReply {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForwardReply {
    control: Option<Control>,
}

/// 选择器配置
#[derive(Debug, Clone)]
pub struct SelectorSet {
    pub question: String,
    pub forward: Vec<String>,
}

/// CDP 控制实现
pub struct CdpControl {
    executor: JsExecutor,
    selectors: SelectorSet,
}

impl CdpControl {
    pub fn new(executor: JsExecutor, selectors: SelectorSet) -> Self {
        Self {
            executor,
            selectors,
        }
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    fn kind_selector(kind: ControlKind) -> &'static str {
        match kind {
            ControlKind::Radio => "input[type='radio']",
            ControlKind::Checkbox => "input[type='checkbox']",
            ControlKind::TextInput => {
                "input[type='text'], input[type='number'], input:not([type]), textarea"
            }
            ControlKind::Forward => "#ls-button-submit",
        }
    }

    fn kind_name(kind: ControlKind) -> &'static str {
        match kind {
            ControlKind::Radio => "radio",
            ControlKind::Checkbox => "checkbox",
            ControlKind::TextInput => "text_input",
            ControlKind::Forward => "forward",
        }
    }
}

/// JS 字符串字面量
pub(crate) fn js_literal(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[async_trait]
impl BrowserControl for CdpControl {
    async fn region_text(&self, role: RegionRole) -> Result<Option<String>, ControlError> {
        let selector = match role {
            RegionRole::QuestionText => self.selectors.question.as_str(),
            RegionRole::Body => "body",
        };
        let js = REGION_TEMPLATE.replace("__SELECTOR__", &js_literal(selector));
        let reply: RegionReply = self.executor.eval_as(js).await?;
        Ok(reply.text)
    }

    async fn controls(&self, kind: ControlKind) -> Result<Vec<Control>, ControlError> {
        let js = ENUMERATE_TEMPLATE
            .replace("__PRELUDE__", STAMP_PRELUDE)
            .replace("__SELECTOR__", &js_literal(Self::kind_selector(kind)))
            .replace("__KIND__", &js_literal(Self::kind_name(kind)));
        let controls: Vec<Control> = self.executor.eval_as(js).await?;
        debug!("枚举到 {} 个 {:?} 控件", controls.len(), kind);
        Ok(controls)
    }

    async fn forward_control(&self) -> Result<Option<Control>, ControlError> {
        let selectors = serde_json::to_string(&self.selectors.forward)?;
        let js = FORWARD_TEMPLATE
            .replace("__PRELUDE__", STAMP_PRELUDE)
            .replace("__SELECTORS__", &selectors);
        let reply: ForwardReply = self.executor.eval_as(js).await?;
        Ok(reply.control)
    }

    async fn click(&self, control_id: &str) -> Result<(), ControlError> {
        let js = CLICK_TEMPLATE.replace("__ID__", &js_literal(control_id));
        let found: bool = self.executor.eval_as(js).await?;
        if found {
            Ok(())
        } else {
            Err(ControlError::StaleControl(control_id.to_string()))
        }
    }

    async fn set_value(&self, control_id: &str, value: &str) -> Result<(), ControlError> {
        let js = SET_VALUE_TEMPLATE
            .replace("__ID__", &js_literal(control_id))
            .replace("__VALUE__", &js_literal(value));
        let found: bool = self.executor.eval_as(js).await?;
        if found {
            Ok(())
        } else {
            Err(ControlError::StaleControl(control_id.to_string()))
        }
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<(), ControlError> {
        let poll = async {
            loop {
                let state: String = self.executor.eval_as("document.readyState").await?;
                if state == "complete" {
                    return Ok::<(), ControlError>(());
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => result,
            Err(_) => {
                warn!("页面加载超时 ({}ms)", timeout.as_millis());
                Err(ControlError::Timeout {
                    what: "document.readyState".to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

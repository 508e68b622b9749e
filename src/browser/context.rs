//! 会话上下文：一个浏览器进程 + 登录后的问卷页面

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::browser::headless::{launch_clean_browser, LaunchedBrowser};
use crate::config::{BrowserSettings, SurveyConfig, TimingConfig};
use crate::error::ControlError;
use crate::infrastructure::cdp_control::js_literal;
use crate::infrastructure::{
    BrowserControl, CdpControl, ContextFactory, ControlContext, JsExecutor, SelectorSet,
};

const CLICK_SELECTOR_TEMPLATE: &str = r#"
(() => {
    const el = document.querySelector(__SELECTOR__);
    if (!el) return false;
    el.removeAttribute('target');
    el.click();
    return true;
})()
"#;

const FILL_SELECTOR_TEMPLATE: &str = r#"
(() => {
    const el = document.querySelector(__SELECTOR__);
    if (!el) return false;
    el.focus();
    el.value = __VALUE__;
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
})()
"#;

/// 基于 chromiumoxide 的会话上下文
pub struct CdpContext {
    control: CdpControl,
    launched: Option<LaunchedBrowser>,
}

#[async_trait]
impl ControlContext for CdpContext {
    fn control(&self) -> &dyn BrowserControl {
        &self.control
    }

    async fn close(&mut self) -> Result<(), ControlError> {
        let Some(mut launched) = self.launched.take() else {
            return Ok(());
        };
        let closed = launched.browser.close().await;
        let _ = launched.browser.wait().await;
        launched.handler.abort();
        debug!("浏览器已关闭: {}", launched.profile_dir.path().display());
        closed.map(|_| ()).map_err(ControlError::from)
    }
}

/// 为每个访问码打开全新的浏览器并完成登录
pub struct CdpContextFactory {
    survey: SurveyConfig,
    browser: BrowserSettings,
    timing: TimingConfig,
}

impl CdpContextFactory {
    pub fn new(survey: SurveyConfig, browser: BrowserSettings, timing: TimingConfig) -> Self {
        Self {
            survey,
            browser,
            timing,
        }
    }

    async fn login(&self, control: &CdpControl, access_code: &str) -> Result<(), ControlError> {
        let executor = control.executor();
        control.wait_ready(self.timing.page_load_timeout()).await?;

        if !self.survey.survey_selector.is_empty() {
            let js = CLICK_SELECTOR_TEMPLATE
                .replace("__SELECTOR__", &js_literal(&self.survey.survey_selector));
            if !executor.eval_as::<bool>(js).await? {
                return Err(ControlError::ContextSetup(format!(
                    "入口页上没有问卷链接: {}",
                    self.survey.survey_selector
                )));
            }
            control.settle(self.timing.login_settle()).await;
            control.wait_ready(self.timing.page_load_timeout()).await?;
        }

        let js = FILL_SELECTOR_TEMPLATE
            .replace("__SELECTOR__", &js_literal(&self.survey.code_input_selector))
            .replace("__VALUE__", &js_literal(access_code));
        if !executor.eval_as::<bool>(js).await? {
            return Err(ControlError::ContextSetup(format!(
                "找不到访问码输入框: {}",
                self.survey.code_input_selector
            )));
        }

        let js = CLICK_SELECTOR_TEMPLATE.replace(
            "__SELECTOR__",
            &js_literal(&self.survey.access_code_submit_selector),
        );
        if !executor.eval_as::<bool>(js).await? {
            return Err(ControlError::ContextSetup(format!(
                "找不到访问码提交按钮: {}",
                self.survey.access_code_submit_selector
            )));
        }
        control.settle(self.timing.login_settle()).await;
        Ok(())
    }
}

#[async_trait]
impl ContextFactory for CdpContextFactory {
    async fn open(&self, access_code: &str) -> Result<Box<dyn ControlContext>, ControlError> {
        let mut launched = launch_clean_browser(&self.browser).await?;

        let page = match launched.browser.new_page(self.survey.base_url.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                let _ = launched.browser.close().await;
                launched.handler.abort();
                return Err(ControlError::ContextSetup(format!("打开入口页失败: {}", e)));
            }
        };
        info!("✓ 已打开入口页: {}", self.survey.base_url);

        let control = CdpControl::new(
            JsExecutor::new(page),
            SelectorSet {
                question: self.survey.question_selector.clone(),
                forward: self.survey.forward_selectors.clone(),
            },
        );
        let mut context = CdpContext {
            control,
            launched: Some(launched),
        };

        if let Err(e) = self.login(&context.control, access_code).await {
            warn!("登录失败，关闭浏览器: {}", e);
            let _ = context.close().await;
            return Err(match e {
                ControlError::ContextSetup(_) => e,
                other => ControlError::ContextSetup(other.to_string()),
            });
        }
        info!("✓ 访问码 {} 登录完成", access_code);

        Ok(Box::new(context))
    }
}

//! 测试用的内存浏览器
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use survey_autofill::error::{ControlError, SessionError};
use survey_autofill::infrastructure::{
    BrowserControl, ContextFactory, Control, ControlContext, ControlKind, RegionRole,
};
use survey_autofill::models::{ScenarioStore, StrategyDescriptor};
use survey_autofill::workflow::{AbortSignal, ManualPrompt, OperatorChannel, SessionCtx};
use survey_autofill::Config;

/// 一页假问卷
#[derive(Debug, Clone)]
pub struct FakePage {
    pub question: Option<String>,
    pub body: String,
    /// 控件 id 为页内局部 id，对外暴露时加上访问序号前缀
    pub controls: Vec<Control>,
    pub has_forward: bool,
    /// 点击前进按钮后页面不变化
    pub stalls: bool,
}

impl FakePage {
    pub fn question(text: &str) -> Self {
        Self {
            question: Some(text.to_string()),
            body: text.to_string(),
            controls: Vec::new(),
            has_forward: true,
            stalls: false,
        }
    }

    /// 矩阵题：`rows` 行，每行包含 `options` 中的所有选项
    pub fn matrix(text: &str, rows: usize, options: &[&str]) -> Self {
        let texts: Vec<String> = (1..=rows).map(|r| format!("Tvrzení číslo {r}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        Self::matrix_with_rows(text, &refs, options)
    }

    pub fn matrix_with_rows(text: &str, row_texts: &[&str], options: &[&str]) -> Self {
        let mut page = Self::question(text);
        for (r, row_text) in row_texts.iter().enumerate() {
            for option in options {
                let group = format!("answer12X3SQ{:03}", r + 1);
                let mut c = Control::new(format!("c{}", page.controls.len()), ControlKind::Radio);
                c.dom_id = format!("{group}-{option}");
                c.name = group;
                c.value = option.to_string();
                c.label = option.to_string();
                c.row_text = row_text.to_string();
                page.controls.push(c);
            }
        }
        page
    }

    /// 单组单选项，label 按顺序给出
    pub fn radios(text: &str, labels: &[&str]) -> Self {
        let mut page = Self::question(text);
        for (i, label) in labels.iter().enumerate() {
            let mut c = Control::new(format!("c{i}"), ControlKind::Radio);
            c.dom_id = format!("answer12X4-A{}", i + 1);
            c.name = "answer12X4".to_string();
            c.label = label.to_string();
            page.controls.push(c);
        }
        page
    }

    pub fn checkboxes(text: &str, count: usize) -> Self {
        let mut page = Self::question(text);
        for i in 0..count {
            let mut c = Control::new(format!("c{i}"), ControlKind::Checkbox);
            c.dom_id = format!("answer12X5SQ{:03}", i + 1);
            c.label = format!("Možnost {}", i + 1);
            page.controls.push(c);
        }
        page
    }

    pub fn inputs(text: &str, existing: &[&str]) -> Self {
        let mut page = Self::question(text);
        for (i, value) in existing.iter().enumerate() {
            let mut c = Control::new(format!("c{i}"), ControlKind::TextInput);
            c.dom_id = format!("answer12X6-{i}");
            c.value = value.to_string();
            page.controls.push(c);
        }
        page
    }

    pub fn cover(body: &str) -> Self {
        Self {
            question: None,
            body: body.to_string(),
            controls: Vec::new(),
            has_forward: true,
            stalls: false,
        }
    }

    pub fn end() -> Self {
        Self {
            question: None,
            body: "Děkujeme za vyplnění dotazníku.".to_string(),
            controls: Vec::new(),
            has_forward: false,
            stalls: false,
        }
    }

    pub fn stalled(mut self) -> Self {
        self.stalls = true;
        self
    }

    pub fn without_forward(mut self) -> Self {
        self.has_forward = false;
        self
    }

    pub fn select(mut self, local_id: &str) -> Self {
        if let Some(c) = self.controls.iter_mut().find(|c| c.id == local_id) {
            c.checked = true;
        }
        self
    }
}

#[derive(Debug, Default)]
struct State {
    pages: Vec<FakePage>,
    current: usize,
    /// 每次换页加一，控件句柄随之变化
    visit: usize,
    forward_checks: usize,
    control_clicks: usize,
    failing_clicks: usize,
    events: Vec<String>,
}

impl State {
    fn page(&self) -> &FakePage {
        &self.pages[self.current]
    }

    fn external_id(&self, local: &str) -> String {
        format!("p{}-{}", self.visit, local)
    }

    fn forward_id(&self) -> String {
        self.external_id("next")
    }

    fn local_id<'a>(&self, id: &'a str) -> Option<&'a str> {
        id.strip_prefix(&format!("p{}-", self.visit))
    }
}

/// 内存中的浏览器控制实现
#[derive(Default)]
pub struct FakeBrowser {
    state: Mutex<State>,
}

impl FakeBrowser {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            state: Mutex::new(State {
                pages,
                ..Default::default()
            }),
        }
    }

    /// 接下来 `n` 次点击普通控件时返回失效错误
    pub fn fail_next_clicks(&self, n: usize) {
        self.state.lock().unwrap().failing_clicks = n;
    }

    pub fn current_page(&self) -> usize {
        self.state.lock().unwrap().current
    }

    pub fn forward_checks(&self) -> usize {
        self.state.lock().unwrap().forward_checks
    }

    pub fn control_clicks(&self) -> usize {
        self.state.lock().unwrap().control_clicks
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn page(&self, index: usize) -> FakePage {
        self.state.lock().unwrap().pages[index].clone()
    }

    /// 第 `index` 页上每一行被选中的选项代码
    pub fn selections(&self, index: usize) -> Vec<(String, String)> {
        self.page(index)
            .controls
            .iter()
            .filter(|c| c.kind == ControlKind::Radio && c.checked)
            .map(|c| (c.row_group().unwrap_or_default(), c.option_code().unwrap_or_default()))
            .collect()
    }
}

#[async_trait]
impl BrowserControl for FakeBrowser {
    async fn region_text(&self, role: RegionRole) -> Result<Option<String>, ControlError> {
        let state = self.state.lock().unwrap();
        Ok(match role {
            RegionRole::QuestionText => state.page().question.clone(),
            RegionRole::Body => Some(state.page().body.clone()),
        })
    }

    async fn controls(&self, kind: ControlKind) -> Result<Vec<Control>, ControlError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .page()
            .controls
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| {
                let mut exposed = c.clone();
                exposed.id = state.external_id(&c.id);
                exposed
            })
            .collect())
    }

    async fn forward_control(&self) -> Result<Option<Control>, ControlError> {
        let mut state = self.state.lock().unwrap();
        state.forward_checks += 1;
        if !state.page().has_forward {
            return Ok(None);
        }
        Ok(Some(Control::new(state.forward_id(), ControlKind::Forward)))
    }

    async fn click(&self, control_id: &str) -> Result<(), ControlError> {
        let mut state = self.state.lock().unwrap();

        if control_id == state.forward_id() && state.page().has_forward {
            if !state.page().stalls && state.current + 1 < state.pages.len() {
                state.current += 1;
                state.visit += 1;
            }
            return Ok(());
        }

        if state.failing_clicks > 0 {
            state.failing_clicks -= 1;
            return Err(ControlError::StaleControl(control_id.to_string()));
        }

        let local = state
            .local_id(control_id)
            .map(str::to_string)
            .ok_or_else(|| ControlError::StaleControl(control_id.to_string()))?;
        let current = state.current;
        let page = &mut state.pages[current];
        let target = page
            .controls
            .iter()
            .find(|c| c.id == local)
            .cloned()
            .ok_or_else(|| ControlError::StaleControl(control_id.to_string()))?;

        match target.kind {
            ControlKind::Radio => {
                let group = target.row_group();
                for c in page.controls.iter_mut() {
                    if c.kind == ControlKind::Radio && c.row_group() == group {
                        c.checked = c.id == local;
                    }
                }
            }
            ControlKind::Checkbox => {
                if let Some(c) = page.controls.iter_mut().find(|c| c.id == local) {
                    c.checked = !c.checked;
                }
            }
            _ => {}
        }
        state.control_clicks += 1;
        Ok(())
    }

    async fn set_value(&self, control_id: &str, value: &str) -> Result<(), ControlError> {
        let mut state = self.state.lock().unwrap();
        let local = state
            .local_id(control_id)
            .map(str::to_string)
            .ok_or_else(|| ControlError::StaleControl(control_id.to_string()))?;
        let current = state.current;
        let control = state.pages[current]
            .controls
            .iter_mut()
            .find(|c| c.id == local)
            .ok_or_else(|| ControlError::StaleControl(control_id.to_string()))?;
        control.value = value.to_string();
        for event in ["focus", "input", "change", "blur"] {
            state.events.push(format!("{local}:{event}"));
        }
        Ok(())
    }

    async fn wait_ready(&self, _timeout: Duration) -> Result<(), ControlError> {
        Ok(())
    }

    async fn settle(&self, _duration: Duration) {}
}

/// 操作员：记录调用次数，可以在第一次调用时发出中止信号
#[derive(Default)]
pub struct ScriptedOperator {
    pub calls: AtomicUsize,
    pub abort_on_resume: Option<AbortSignal>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OperatorChannel for ScriptedOperator {
    async fn await_resume(&self, _ctx: &SessionCtx, prompt: &ManualPrompt) -> Result<(), SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(abort) = &self.abort_on_resume {
            abort.raise();
        }
        Ok(())
    }
}

/// 工厂脚本：每次 `open` 依次取一个
pub enum Scripted {
    SetupFailure,
    Pages(Vec<FakePage>),
}

pub struct FakeContext {
    browser: FakeBrowser,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl ControlContext for FakeContext {
    fn control(&self) -> &dyn BrowserControl {
        &self.browser
    }

    async fn close(&mut self) -> Result<(), ControlError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeFactory {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Vec<FakePage>,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub codes: Mutex<Vec<String>>,
}

impl FakeFactory {
    /// 脚本用完后每次都返回 `fallback` 的副本
    pub fn new(script: Vec<Scripted>, fallback: Vec<FakePage>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            codes: Mutex::new(Vec::new()),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContextFactory for FakeFactory {
    async fn open(&self, access_code: &str) -> Result<Box<dyn ControlContext>, ControlError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.codes.lock().unwrap().push(access_code.to_string());
        let next = self.script.lock().unwrap().pop_front();
        let pages = match next {
            Some(Scripted::SetupFailure) => {
                return Err(ControlError::ContextSetup(format!("登录失败: {access_code}")))
            }
            Some(Scripted::Pages(pages)) => pages,
            None => self.fallback.clone(),
        };
        Ok(Box::new(FakeContext {
            browser: FakeBrowser::new(pages),
            closed: Arc::clone(&self.closed),
        }))
    }
}

/// 测试配置：不等待，复查次数少
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.inter_session_delay_secs = 0;
    config.timing.recheck_bound = 3;
    config.timing.recheck_interval_ms = 1;
    config.random_seed = Some(42);
    config
}

pub fn store(entries: Vec<(&str, StrategyDescriptor)>) -> Arc<ScenarioStore> {
    Arc::new(ScenarioStore::from_entries(entries).expect("场景库应当有效"))
}

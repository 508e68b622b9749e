//! 程序配置
//!
//! 优先级：默认值 < TOML 配置文件 < 环境变量 < 命令行参数

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::UserProfile;

/// 问卷站点与页面选择器
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// 登录入口
    pub base_url: String,
    /// 入口页上指向问卷的链接
    pub survey_selector: String,
    /// 访问码输入框
    pub code_input_selector: String,
    /// 访问码提交按钮
    pub access_code_submit_selector: String,
    /// 题干区域
    pub question_selector: String,
    /// 前进按钮，按顺序尝试
    pub forward_selectors: Vec<String>,
    /// 结束页上的完成标记（不区分大小写）
    pub completion_markers: Vec<String>,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.mojeskola.cz/".to_string(),
            survey_selector: "a[href*='dotaznik']".to_string(),
            code_input_selector: "#token".to_string(),
            access_code_submit_selector: "button[type='submit']".to_string(),
            question_selector: ".question-text .ls-label-question".to_string(),
            forward_selectors: vec![
                "#ls-button-submit".to_string(),
                "button[name='move'][value='movenext']".to_string(),
                "button[name='move'][value='movesubmit']".to_string(),
            ],
            completion_markers: vec![
                "děkujeme".to_string(),
                "dokončeno".to_string(),
                "dostali jste se na konec".to_string(),
            ],
        }
    }
}

/// 浏览器启动参数
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// 不设置时由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_executable: None,
            window_width: 1280,
            window_height: 900,
        }
    }
}

/// 等待与复查参数
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// 等待页面就绪的上限
    pub page_load_timeout_ms: u64,
    /// 点击前进后最多复查的次数
    pub recheck_bound: u32,
    /// 两次复查之间的间隔
    pub recheck_interval_ms: u64,
    /// 登录各步骤之间的等待
    pub login_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_load_timeout_ms: 15_000,
            recheck_bound: 10,
            recheck_interval_ms: 500,
            login_settle_ms: 1_500,
        }
    }
}

impl TimingConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn recheck_interval(&self) -> Duration {
        Duration::from_millis(self.recheck_interval_ms)
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms)
    }
}

/// 用户资料：固定值 + 每个会话抽取一次的随机范围
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub values: BTreeMap<String, String>,
    /// 闭区间 `[min, max]`，覆盖同名的固定值
    pub random_ranges: BTreeMap<String, [i64; 2]>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        values.insert("birth_year".to_string(), "1972".to_string());
        Self {
            values,
            random_ranges: BTreeMap::new(),
        }
    }
}

impl ProfileConfig {
    /// 为一个会话生成用户资料
    pub fn resolve<R: Rng>(&self, rng: &mut R) -> UserProfile {
        let mut profile = UserProfile::new(self.values.clone());
        for (field, [min, max]) in &self.random_ranges {
            profile.insert(field.clone(), rng.random_range(*min..=*max).to_string());
        }
        profile
    }
}

/// 程序配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 场景库文件（.toml 或 .json）
    pub scenario_file: String,
    /// 访问码列表
    pub access_codes: Vec<String>,
    /// 访问码文件，一行一个；与 `access_codes` 合并
    pub access_code_file: Option<String>,
    /// 瞬时失败的额外重试次数
    pub retry_bound: u32,
    /// 两个会话之间的等待
    pub inter_session_delay_secs: u64,
    /// 模糊匹配阈值
    pub fuzzy_threshold: f64,
    /// 把所有 matrix_fixed 条目按随机评分执行
    pub random_matrix: bool,
    pub random_ratings: Vec<String>,
    /// 固定随机种子，便于复现
    pub random_seed: Option<u64>,
    /// 单个会话的页面上限
    pub max_pages: usize,
    /// 同一问题连续出现多少次视为循环
    pub loop_threshold: usize,
    /// 执行策略时控制层出错后重新识别的次数
    pub execution_retries: u32,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 批量报告目录
    pub results_dir: String,
    /// 输出日志文件
    pub output_log_file: String,
    pub survey: SurveyConfig,
    pub browser: BrowserSettings,
    pub timing: TimingConfig,
    pub profile: ProfileConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario_file: "scenarios/survey.toml".to_string(),
            access_codes: Vec::new(),
            access_code_file: None,
            retry_bound: 3,
            inter_session_delay_secs: 5,
            fuzzy_threshold: 0.85,
            random_matrix: false,
            random_ratings: vec!["A5".to_string(), "A6".to_string(), "A7".to_string()],
            random_seed: None,
            max_pages: 60,
            loop_threshold: 3,
            execution_retries: 2,
            verbose_logging: false,
            results_dir: "results".to_string(),
            output_log_file: "output.txt".to_string(),
            survey: SurveyConfig::default(),
            browser: BrowserSettings::default(),
            timing: TimingConfig::default(),
            profile: ProfileConfig::default(),
        }
    }
}

impl Config {
    /// 从可选的配置文件加载，再应用环境变量并校验
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 只使用默认值 + 环境变量
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::FileInvalid {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        toml::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// 用外部变量覆盖配置；`lookup` 通常是环境变量
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SCENARIO_FILE") {
            self.scenario_file = v;
        }
        if let Some(v) = lookup("ACCESS_CODES") {
            self.access_codes = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = parse_var(&lookup, "RETRY_BOUND", "u32")? {
            self.retry_bound = v;
        }
        if let Some(v) = parse_var(&lookup, "INTER_SESSION_DELAY_SECS", "u64")? {
            self.inter_session_delay_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "FUZZY_THRESHOLD", "f64")? {
            self.fuzzy_threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "RANDOM_MATRIX", "bool")? {
            self.random_matrix = v;
        }
        if let Some(v) = parse_var(&lookup, "BROWSER_HEADLESS", "bool")? {
            self.browser.headless = v;
        }
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.browser.chrome_executable = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "MAX_PAGES", "usize")? {
            self.max_pages = v;
        }
        if let Some(v) = parse_var(&lookup, "VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        if let Some(v) = lookup("RESULTS_DIR") {
            self.results_dir = v;
        }
        if let Some(v) = lookup("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let out_of_range = |field: &str, reason: &str| {
            Err(ConfigError::OutOfRange {
                field: field.to_string(),
                reason: reason.to_string(),
            })
        };

        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return out_of_range("fuzzy_threshold", "必须在 (0, 1] 之间");
        }
        if self.max_pages == 0 {
            return out_of_range("max_pages", "必须大于 0");
        }
        if self.loop_threshold < 2 {
            return out_of_range("loop_threshold", "至少为 2");
        }
        if self.timing.recheck_bound == 0 {
            return out_of_range("timing.recheck_bound", "必须大于 0");
        }
        if self.random_matrix && self.random_ratings.is_empty() {
            return out_of_range("random_ratings", "启用 random_matrix 时不能为空");
        }
        if self.survey.forward_selectors.is_empty() {
            return out_of_range("survey.forward_selectors", "至少需要一个选择器");
        }
        if self.survey.question_selector.trim().is_empty() {
            return out_of_range("survey.question_selector", "不能为空");
        }
        for (field, [min, max]) in &self.profile.random_ranges {
            if min > max {
                return out_of_range(&format!("profile.random_ranges.{field}"), "下限大于上限");
            }
        }
        Ok(())
    }

    pub fn inter_session_delay(&self) -> Duration {
        Duration::from_secs(self.inter_session_delay_secs)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

//! 描述符 → 可执行策略

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;

use super::{
    BarrierFree, CheckboxByIndex, InputFill, MatrixFixed, MatrixRandom, RadioByLabel, Skip,
    Strategy,
};
use crate::models::{ActionType, StrategyDescriptor, UserProfile};

/// 默认的随机评分范围：5、6、7 分
pub const DEFAULT_RANDOM_RATINGS: [&str; 3] = ["A5", "A6", "A7"];

/// matrix_fixed 条目的运行模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixMode {
    /// 按场景库里的固定评分
    Fixed,
    /// 全局开关：把固定评分替换为随机评分
    Random { ratings: Vec<String> },
}

impl MatrixMode {
    pub fn random_default() -> Self {
        MatrixMode::Random {
            ratings: DEFAULT_RANDOM_RATINGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct StrategyFactory {
    matrix_mode: MatrixMode,
    seed: Option<u64>,
}

impl StrategyFactory {
    pub fn new(matrix_mode: MatrixMode, seed: Option<u64>) -> Self {
        Self { matrix_mode, seed }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// 构建策略；参数在加载场景库时已校验过，缺失字段按空值处理
    pub fn build(&self, descriptor: &StrategyDescriptor, profile: &UserProfile) -> Box<dyn Strategy> {
        let p = &descriptor.parameters;
        match descriptor.action_type {
            ActionType::MatrixFixed => match &self.matrix_mode {
                MatrixMode::Fixed => {
                    Box::new(MatrixFixed::new(p.rating.clone().unwrap_or_default()))
                }
                MatrixMode::Random { ratings } => {
                    Box::new(MatrixRandom::with_rng(ratings.clone(), self.rng()))
                }
            },
            ActionType::MatrixRandom => Box::new(MatrixRandom::with_rng(p.ratings.clone(), self.rng())),
            ActionType::CheckboxByIndex => Box::new(CheckboxByIndex::new(&p.positions)),
            ActionType::RadioByLabel => {
                Box::new(RadioByLabel::new(p.phrase.clone().unwrap_or_default()))
            }
            ActionType::InputFill => Box::new(resolve_input(
                p.profile_field.as_deref(),
                p.value.as_deref(),
                profile,
            )),
            ActionType::BarrierFree => Box::new(BarrierFree::new(
                p.keywords.clone(),
                p.barrier_rating.clone(),
                p.default_rating.clone(),
            )),
            ActionType::Skip => Box::new(Skip),
        }
    }
}

impl Default for StrategyFactory {
    fn default() -> Self {
        Self::new(MatrixMode::Fixed, None)
    }
}

/// 优先使用资料字段，其次是带占位符的字面值
fn resolve_input(field: Option<&str>, value: Option<&str>, profile: &UserProfile) -> InputFill {
    if let Some(field) = field {
        if let Some(resolved) = profile.get(field) {
            return InputFill::new(resolved);
        }
        if value.is_none() {
            warn!("用户资料中没有字段 '{}'", field);
            return InputFill::unresolved(field);
        }
    }
    match value.map(|v| profile.render(v)) {
        Some(Ok(rendered)) => InputFill::new(rendered),
        Some(Err(missing)) => {
            warn!("用户资料中没有字段 '{}'", missing);
            InputFill::unresolved(missing)
        }
        None => InputFill::unresolved(field.unwrap_or("value")),
    }
}

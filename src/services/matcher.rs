//! 场景匹配
//!
//! 固定的匹配顺序：精确匹配 → 带阈值的模糊匹配 → 无匹配。
//! 精确匹配永远优先，哪怕某个模糊候选的得分更高。

use tracing::debug;

use crate::models::{ScenarioStore, StrategyDescriptor};
use crate::services::normalizer::normalize;

/// 默认模糊匹配阈值
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

/// 浮点比较容差，避免 0.85 这类值在计算中产生的舍入误差
const SCORE_EPSILON: f64 = 1e-9;

/// 匹配候选
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: String,
    pub score: f64,
}

/// 匹配结果
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<'a> {
    Exact {
        key: String,
        descriptor: &'a StrategyDescriptor,
    },
    Fuzzy {
        key: String,
        descriptor: &'a StrategyDescriptor,
        score: f64,
    },
    /// `best_guess` 为低于阈值的最佳候选（低置信度）
    NoMatch { best_guess: Option<Candidate> },
}

impl MatchOutcome<'_> {
    pub fn descriptor(&self) -> Option<&StrategyDescriptor> {
        match self {
            MatchOutcome::Exact { descriptor, .. } | MatchOutcome::Fuzzy { descriptor, .. } => {
                Some(descriptor)
            }
            MatchOutcome::NoMatch { .. } => None,
        }
    }
}

/// 归一化的 Levenshtein 相似度：`1 - 距离 / 较长串长度`
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// 得分是否达到阈值（恰好等于阈值算达到）
pub fn meets_threshold(score: f64, threshold: f64) -> bool {
    score + SCORE_EPSILON >= threshold
}

/// 场景匹配器
#[derive(Debug, Clone)]
pub struct ScenarioMatcher {
    threshold: f64,
}

impl Default for ScenarioMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl ScenarioMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 把原始题干解析为策略描述符
    pub fn resolve<'a>(&self, raw_text: &str, store: &'a ScenarioStore) -> MatchOutcome<'a> {
        let key = normalize(raw_text);

        if let Some(descriptor) = store.get(&key) {
            debug!("精确匹配: '{}'", key);
            return MatchOutcome::Exact { key, descriptor };
        }

        let best = store
            .iter()
            .map(|(stored, descriptor)| (stored, descriptor, similarity(&key, stored)))
            .max_by(|(ka, _, sa), (kb, _, sb)| {
                sa.total_cmp(sb)
                    .then_with(|| ka.chars().count().cmp(&kb.chars().count()))
                    .then_with(|| kb.cmp(ka))
            });

        match best {
            Some((stored, descriptor, score)) if meets_threshold(score, self.threshold) => {
                debug!("模糊匹配: '{}' → '{}' (得分 {:.3})", key, stored, score);
                MatchOutcome::Fuzzy {
                    key: stored.to_string(),
                    descriptor,
                    score,
                }
            }
            Some((stored, _, score)) => {
                debug!("最佳候选 '{}' 得分 {:.3} 低于阈值 {}", stored, score, self.threshold);
                MatchOutcome::NoMatch {
                    best_guess: Some(Candidate {
                        key: stored.to_string(),
                        score,
                    }),
                }
            }
            None => MatchOutcome::NoMatch { best_guess: None },
        }
    }
}

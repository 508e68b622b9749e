//! 场景描述：问题键 → 填写策略

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

/// 已知的填写动作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    MatrixFixed,
    MatrixRandom,
    CheckboxByIndex,
    RadioByLabel,
    InputFill,
    BarrierFree,
    Skip,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::MatrixFixed => "matrix_fixed",
            ActionType::MatrixRandom => "matrix_random",
            ActionType::CheckboxByIndex => "checkbox_by_index",
            ActionType::RadioByLabel => "radio_by_label",
            ActionType::InputFill => "input_fill",
            ActionType::BarrierFree => "barrier_free",
            ActionType::Skip => "skip",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 策略参数
///
/// 所有动作共用一张扁平参数表，具体哪些字段必填由 [`StrategyDescriptor::validate`] 决定
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// matrix_fixed：固定评分
    pub rating: Option<String>,
    /// matrix_random：候选评分
    pub ratings: Vec<String>,
    /// checkbox_by_index：从 1 开始的位置
    pub positions: Vec<usize>,
    /// radio_by_label：label 中要包含的短语（区分大小写）
    pub phrase: Option<String>,
    /// input_fill：字面值，可包含 `{field}` 占位符
    pub value: Option<String>,
    /// input_fill：直接引用用户资料字段
    pub profile_field: Option<String>,
    /// barrier_free：关键词（不区分大小写）
    pub keywords: Vec<String>,
    /// barrier_free：命中关键词的行选择的评分（"非常不同意"）
    pub barrier_rating: Option<String>,
    /// barrier_free：其余行选择的评分（"同意"）
    pub default_rating: Option<String>,
}

/// 策略描述符，由场景库持有，不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    pub action_type: ActionType,
    #[serde(default)]
    pub parameters: Parameters,
}

impl StrategyDescriptor {
    pub fn new(action_type: ActionType, parameters: Parameters) -> Self {
        Self {
            action_type,
            parameters,
        }
    }

    pub fn matrix_fixed(rating: impl Into<String>) -> Self {
        Self::new(
            ActionType::MatrixFixed,
            Parameters {
                rating: Some(rating.into()),
                ..Default::default()
            },
        )
    }

    pub fn skip() -> Self {
        Self::new(ActionType::Skip, Parameters::default())
    }

    /// 校验参数与动作类型是否匹配
    pub fn validate(&self, question: &str) -> Result<(), StoreError> {
        let p = &self.parameters;
        let invalid = |reason: &str| StoreError::InvalidParameters {
            question: question.to_string(),
            action: self.action_type.to_string(),
            reason: reason.to_string(),
        };

        match self.action_type {
            ActionType::MatrixFixed => {
                if p.rating.as_deref().map_or(true, str::is_empty) {
                    return Err(invalid("缺少 rating"));
                }
            }
            ActionType::MatrixRandom => {
                if p.ratings.is_empty() || p.ratings.iter().any(String::is_empty) {
                    return Err(invalid("ratings 不能为空"));
                }
            }
            ActionType::CheckboxByIndex => {
                if p.positions.is_empty() {
                    return Err(invalid("positions 不能为空"));
                }
                if p.positions.contains(&0) {
                    return Err(invalid("positions 从 1 开始计数"));
                }
            }
            ActionType::RadioByLabel => {
                if p.phrase.as_deref().map_or(true, str::is_empty) {
                    return Err(invalid("缺少 phrase"));
                }
            }
            ActionType::InputFill => {
                if p.value.is_none() && p.profile_field.is_none() {
                    return Err(invalid("需要 value 或 profile_field"));
                }
            }
            ActionType::BarrierFree => {
                if p.keywords.is_empty() || p.keywords.iter().any(|k| k.trim().is_empty()) {
                    return Err(invalid("keywords 不能为空"));
                }
            }
            ActionType::Skip => {}
        }
        Ok(())
    }
}

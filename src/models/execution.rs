use serde::Serialize;
use std::collections::BTreeMap;

/// 一次策略执行的结构化结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub strategy_id: String,
    /// 目标总数（矩阵行 / 复选框位置 / 输入框 ...）
    pub attempted: usize,
    /// 本次新完成的目标
    pub succeeded: usize,
    /// 执行前就已经满足的目标
    pub already_satisfied: usize,
    /// 没找到的目标（部分失败，非致命）
    pub missing: Vec<String>,
    /// 选项代码 → 选择次数
    pub histogram: BTreeMap<String, usize>,
}

impl ExecutionResult {
    pub fn new(strategy_id: impl Into<String>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            ..Default::default()
        }
    }

    /// 没有需要做的事也算成功，可以安全翻页
    pub fn is_success(&self) -> bool {
        self.attempted == 0 || self.succeeded + self.already_satisfied == self.attempted
    }

    pub fn is_partial_failure(&self) -> bool {
        !self.missing.is_empty()
    }

    pub(crate) fn record_selection(&mut self, option: &str) {
        *self.histogram.entry(option.to_string()).or_insert(0) += 1;
    }

    /// 单行摘要，用于日志
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}/{} 新完成, {} 已满足",
            self.strategy_id, self.succeeded, self.attempted, self.already_satisfied
        );
        if !self.missing.is_empty() {
            line.push_str(&format!(", {} 未找到", self.missing.len()));
        }
        if !self.histogram.is_empty() {
            line.push_str(&format!(", 分布 {:?}", self.histogram));
        }
        line
    }
}

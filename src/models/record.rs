//! 会话记录与批量报告

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{FailureKind, SessionError};

/// 会话终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionOutcome {
    Completed,
    Failed,
    Aborted,
}

/// 失败详情
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureInfo {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&SessionError> for FailureInfo {
    fn from(err: &SessionError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// 模糊匹配审计条目，便于之后把页面文本补进场景库
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyAudit {
    pub page_text: String,
    pub matched_key: String,
    pub score: f64,
}

/// 单次会话记录
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub access_code: String,
    pub pages_visited: usize,
    pub manual_interventions: usize,
    /// 在会话开始时为 `None`，进入终态后写入
    pub outcome: Option<SessionOutcome>,
    pub failure: Option<FailureInfo>,
    /// 批量层的重试次数
    pub retries: u32,
    pub started_at: DateTime<Local>,
    pub ended_at: Option<DateTime<Local>>,
    pub strategies_used: BTreeMap<String, usize>,
    pub fuzzy_matches: Vec<FuzzyAudit>,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, access_code: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            access_code: access_code.into(),
            pages_visited: 0,
            manual_interventions: 0,
            outcome: None,
            failure: None,
            retries: 0,
            started_at: Local::now(),
            ended_at: None,
            strategies_used: BTreeMap::new(),
            fuzzy_matches: Vec::new(),
        }
    }

    pub fn record_strategy(&mut self, strategy_id: &str) {
        *self.strategies_used.entry(strategy_id.to_string()).or_insert(0) += 1;
    }

    pub fn record_fuzzy(&mut self, page_text: &str, matched_key: &str, score: f64) {
        self.fuzzy_matches.push(FuzzyAudit {
            page_text: page_text.to_string(),
            matched_key: matched_key.to_string(),
            score,
        });
    }

    /// 进入终态
    pub fn finish(&mut self, outcome: SessionOutcome, failure: Option<FailureInfo>) {
        self.outcome = Some(outcome);
        self.failure = failure;
        self.ended_at = Some(Local::now());
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == Some(SessionOutcome::Completed)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    pub fn duration_secs(&self) -> f64 {
        let end = self.ended_at.unwrap_or_else(Local::now);
        (end - self.started_at).num_milliseconds().max(0) as f64 / 1000.0
    }
}

/// 批量报告
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub started_at: DateTime<Local>,
    pub ended_at: Option<DateTime<Local>>,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub aborted: usize,
    pub success_rate_percent: f64,
    pub average_session_secs: f64,
    pub total_secs: f64,
    pub failure_counts: BTreeMap<FailureKind, usize>,
    pub sessions: Vec<SessionRecord>,
}

impl BatchReport {
    pub fn new(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            started_at: Local::now(),
            ended_at: None,
            total: 0,
            completed: 0,
            failed: 0,
            aborted: 0,
            success_rate_percent: 0.0,
            average_session_secs: 0.0,
            total_secs: 0.0,
            failure_counts: BTreeMap::new(),
            sessions: Vec::new(),
        }
    }

    pub fn push(&mut self, record: SessionRecord) {
        self.total += 1;
        match record.outcome {
            Some(SessionOutcome::Completed) => self.completed += 1,
            Some(SessionOutcome::Aborted) => self.aborted += 1,
            Some(SessionOutcome::Failed) | None => self.failed += 1,
        }
        if let Some(kind) = record.failure_kind() {
            *self.failure_counts.entry(kind).or_insert(0) += 1;
        }
        self.sessions.push(record);
    }

    /// 结束批次并计算汇总指标
    pub fn finalize(&mut self) {
        let ended_at = Local::now();
        self.total_secs = (ended_at - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        self.ended_at = Some(ended_at);

        self.success_rate_percent = if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        };
        self.average_session_secs = if self.sessions.is_empty() {
            0.0
        } else {
            self.sessions.iter().map(SessionRecord::duration_secs).sum::<f64>()
                / self.sessions.len() as f64
        };
    }

    /// 整个批次中出现过的模糊匹配
    pub fn fuzzy_matches(&self) -> impl Iterator<Item = &FuzzyAudit> {
        self.sessions.iter().flat_map(|s| s.fuzzy_matches.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(code: &str, outcome: SessionOutcome, kind: Option<FailureKind>) -> SessionRecord {
        let mut record = SessionRecord::new(format!("s-{code}"), code);
        let failure = kind.map(|kind| FailureInfo {
            kind,
            message: "x".into(),
        });
        record.finish(outcome, failure);
        record
    }

    #[test]
    fn test_batch_report_totals() {
        let mut report = BatchReport::new("batch_test");
        report.push(finished("a", SessionOutcome::Completed, None));
        report.push(finished("b", SessionOutcome::Completed, None));
        report.push(finished("c", SessionOutcome::Failed, Some(FailureKind::NavigationStalled)));
        report.push(finished("d", SessionOutcome::Failed, Some(FailureKind::NavigationStalled)));
        report.finalize();

        assert_eq!(report.total, 4);
        assert_eq!(report.completed, 2);
        assert_eq!(report.failed, 2);
        assert!((report.success_rate_percent - 50.0).abs() < 1e-9);
        assert_eq!(report.failure_counts.get(&FailureKind::NavigationStalled), Some(&2));
        assert!(report.ended_at.is_some());
    }

    #[test]
    fn test_empty_report_has_zero_rate() {
        let mut report = BatchReport::new("empty");
        report.finalize();
        assert_eq!(report.success_rate_percent, 0.0);
        assert_eq!(report.average_session_secs, 0.0);
    }

    #[test]
    fn test_report_serializes_failure_kind_keys() {
        let mut report = BatchReport::new("json");
        report.push(finished("a", SessionOutcome::Failed, Some(FailureKind::ContextSetup)));
        report.finalize();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failure_counts"]["context_setup"], 1);
        assert_eq!(json["sessions"][0]["outcome"], "Failed");
    }
}

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{store, test_config, FakeFactory, FakePage, Scripted, ScriptedOperator};
use survey_autofill::config::Config;
use survey_autofill::error::FailureKind;
use survey_autofill::models::{ScenarioStore, SessionOutcome, StrategyDescriptor};
use survey_autofill::orchestrator::{BatchProcessor, SessionRunner};
use survey_autofill::services::ReportWriter;
use survey_autofill::workflow::{AbortSignal, SessionFlow};
use tempfile::tempdir;

const SCALE: [&str; 7] = ["A1", "A2", "A3", "A4", "A5", "A6", "A7"];

fn scenarios() -> Arc<ScenarioStore> {
    store(vec![("souhlasíte s tvrzením", StrategyDescriptor::matrix_fixed("A6"))])
}

fn good_survey() -> Vec<FakePage> {
    vec![
        FakePage::cover("Vítejte"),
        FakePage::matrix("Souhlasíte s tvrzením?", 3, &SCALE),
        FakePage::end(),
    ]
}

fn stalled_survey() -> Vec<FakePage> {
    vec![FakePage::matrix("Souhlasíte s tvrzením?", 3, &SCALE).stalled(), FakePage::end()]
}

fn processor(
    config: &Config,
    factory: Arc<FakeFactory>,
    operator: Arc<ScriptedOperator>,
    abort: AbortSignal,
) -> BatchProcessor {
    let runner = SessionRunner::new(
        SessionFlow::new(config, scenarios()),
        factory,
        operator,
        abort,
        config.retry_bound,
    );
    BatchProcessor::new(runner, config.profile.clone(), Duration::ZERO).with_seed(Some(7))
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

#[tokio::test]
async fn test_fail_fail_succeed_counts_two_retries() {
    let config = test_config();
    let factory = Arc::new(FakeFactory::new(
        vec![Scripted::Pages(stalled_survey()), Scripted::Pages(stalled_survey())],
        good_survey(),
    ));
    let batch = processor(&config, Arc::clone(&factory), Arc::default(), AbortSignal::new());

    let report = batch.run(&codes(&["KOD1"])).await;

    assert_eq!(report.total, 1);
    assert_eq!(report.completed, 1);
    let record = &report.sessions[0];
    assert_eq!(record.outcome, Some(SessionOutcome::Completed));
    assert_eq!(record.retries, 2);
    assert_eq!(factory.opened(), 3);
    assert_eq!(factory.closed(), 3);
}

#[tokio::test]
async fn test_retries_stop_at_bound() {
    let mut config = test_config();
    config.retry_bound = 2;
    let factory = Arc::new(FakeFactory::new(Vec::new(), stalled_survey()));
    let batch = processor(&config, Arc::clone(&factory), Arc::default(), AbortSignal::new());

    let report = batch.run(&codes(&["KOD1"])).await;

    let record = &report.sessions[0];
    assert_eq!(record.outcome, Some(SessionOutcome::Failed));
    assert_eq!(record.failure_kind(), Some(FailureKind::NavigationStalled));
    assert_eq!(record.retries, 2);
    assert_eq!(factory.opened(), 3);
}

#[tokio::test]
async fn test_failing_code_does_not_halt_batch() {
    let mut config = test_config();
    config.retry_bound = 1;
    let factory = Arc::new(FakeFactory::new(
        vec![Scripted::SetupFailure, Scripted::SetupFailure],
        good_survey(),
    ));
    let batch = processor(&config, Arc::clone(&factory), Arc::default(), AbortSignal::new());

    let report = batch.run(&codes(&["ZLY", "DOBRY"])).await;

    assert_eq!(report.total, 2);
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failure_counts.get(&FailureKind::ContextSetup), Some(&1));
    assert_eq!(report.sessions[0].retries, 1);
    assert_eq!(report.sessions[1].access_code, "DOBRY");
    assert_eq!(*factory.codes.lock().unwrap(), vec!["ZLY", "ZLY", "DOBRY"]);
    assert!((report.success_rate_percent - 50.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_no_retry_after_manual_intervention() {
    let config = test_config();
    let survey = vec![
        FakePage::question("Neznámá otázka").stalled(),
        FakePage::end(),
    ];
    let factory = Arc::new(FakeFactory::new(Vec::new(), survey));
    let operator = Arc::new(ScriptedOperator::default());
    let batch = processor(&config, Arc::clone(&factory), Arc::clone(&operator), AbortSignal::new());

    let report = batch.run(&codes(&["KOD1"])).await;

    let record = &report.sessions[0];
    assert_eq!(record.outcome, Some(SessionOutcome::Failed));
    assert_eq!(record.manual_interventions, 1);
    assert_eq!(record.retries, 0);
    assert_eq!(factory.opened(), 1);
    assert_eq!(operator.calls(), 1);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let mut config = test_config();
    config.max_pages = 1;
    let factory = Arc::new(FakeFactory::new(Vec::new(), good_survey()));
    let batch = processor(&config, Arc::clone(&factory), Arc::default(), AbortSignal::new());

    let report = batch.run(&codes(&["KOD1"])).await;

    assert_eq!(report.sessions[0].failure_kind(), Some(FailureKind::PageLimitExceeded));
    assert_eq!(factory.opened(), 1);
}

#[tokio::test]
async fn test_abort_stops_remaining_codes() {
    let config = test_config();
    let survey = vec![
        FakePage::question("Neznámá otázka"),
        FakePage::question("Další"),
        FakePage::end(),
    ];
    let abort = AbortSignal::new();
    let operator = Arc::new(ScriptedOperator {
        abort_on_resume: Some(abort.clone()),
        ..Default::default()
    });
    let factory = Arc::new(FakeFactory::new(Vec::new(), survey));
    let batch = processor(&config, Arc::clone(&factory), operator, abort);

    let report = batch.run(&codes(&["PRVNI", "DRUHY", "TRETI"])).await;

    assert_eq!(report.total, 1);
    assert_eq!(report.aborted, 1);
    assert_eq!(factory.opened(), 1);
    assert!(report.ended_at.is_some());
}

#[tokio::test]
async fn test_report_is_written() {
    let dir = tempdir().unwrap();
    let config = test_config();
    let factory = Arc::new(FakeFactory::new(Vec::new(), good_survey()));
    let writer = ReportWriter::new(dir.path().join("results"), dir.path().join("output.txt"));
    let batch = processor(&config, factory, Arc::default(), AbortSignal::new()).with_writer(writer);

    let report = batch.run(&codes(&["A1", "B2"])).await;
    let path = batch.writer().unwrap().save(&report).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["completed"], 2);
    assert_eq!(json["sessions"][1]["access_code"], "B2");
    assert_eq!(json["sessions"][0]["outcome"], "Completed");

    let log = std::fs::read_to_string(dir.path().join("output.txt")).unwrap();
    assert_eq!(log.lines().count(), 2);
}

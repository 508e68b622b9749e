mod common;

use std::sync::Arc;

use common::{store, test_config, FakeBrowser, FakePage, ScriptedOperator};
use survey_autofill::error::FailureKind;
use survey_autofill::models::{
    ActionType, Parameters, SessionOutcome, StrategyDescriptor, UserProfile,
};
use survey_autofill::services::{ActionExecutor, ScenarioMatcher};
use survey_autofill::workflow::{AbortSignal, SessionCtx, SessionFlow};

const SCALE: [&str; 7] = ["A1", "A2", "A3", "A4", "A5", "A6", "A7"];

fn ctx() -> SessionCtx {
    let mut profile = UserProfile::default();
    profile.insert("birth_year", "1972");
    SessionCtx::new("TEST01", 1, 1, profile)
}

fn input_fill_profile() -> StrategyDescriptor {
    StrategyDescriptor::new(
        ActionType::InputFill,
        Parameters {
            profile_field: Some("birth_year".to_string()),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_end_to_end_exact_match_fills_every_row() {
    let store = store(vec![("souhlasíte s tvrzením", StrategyDescriptor::matrix_fixed("A6"))]);
    let raw = "Souhlasíte s tvrzením?\n ";

    let matcher = ScenarioMatcher::default();
    let descriptor = matcher.resolve(raw, &store).descriptor().cloned().unwrap();
    let browser = FakeBrowser::new(vec![FakePage::matrix(raw, 6, &SCALE)]);
    let result = ActionExecutor::default()
        .execute(&browser, &descriptor, &UserProfile::default())
        .await
        .unwrap();

    assert_eq!(result.strategy_id, "matrix_fixed");
    assert_eq!(result.succeeded, 6);
}

#[tokio::test]
async fn test_session_completes_survey() {
    let store = store(vec![
        ("souhlasíte s tvrzením", StrategyDescriptor::matrix_fixed("A6")),
        ("rok narození", input_fill_profile()),
    ]);
    let flow = SessionFlow::new(&test_config(), store);
    let browser = FakeBrowser::new(vec![
        FakePage::cover("Vítejte"),
        FakePage::matrix("Souhlasíte s tvrzením?\n ", 3, &SCALE),
        FakePage::inputs("Rok narození:", &[""]),
        FakePage::end(),
    ]);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.outcome, Some(SessionOutcome::Completed));
    assert_eq!(record.pages_visited, 4);
    assert_eq!(record.manual_interventions, 0);
    assert_eq!(record.strategies_used.get("matrix_fixed"), Some(&1));
    assert_eq!(record.strategies_used.get("input_fill"), Some(&1));
    assert!(record.ended_at.is_some());
    assert_eq!(browser.selections(1).len(), 3);
    assert_eq!(browser.page(2).controls[0].value, "1972");
    assert_eq!(operator.calls(), 0);
}

#[tokio::test]
async fn test_unknown_page_waits_for_operator() {
    let store = store(vec![("souhlasíte s tvrzením", StrategyDescriptor::matrix_fixed("A6"))]);
    let flow = SessionFlow::new(&test_config(), store);
    let browser = FakeBrowser::new(vec![
        FakePage::radios("Jaká je vaše oblíbená barva?", &["modrá", "zelená"]),
        FakePage::end(),
    ]);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.outcome, Some(SessionOutcome::Completed));
    assert_eq!(record.manual_interventions, 1);
    assert_eq!(operator.calls(), 1);
    assert!(record.strategies_used.is_empty());
    // 操作员处理的页面不会被策略点击
    assert_eq!(browser.control_clicks(), 0);
    let prompt = operator.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("Jaká je vaše oblíbená barva?"));
}

#[tokio::test]
async fn test_fuzzy_match_is_recorded_for_audit() {
    let store = store(vec![(
        "jak jste spokojeni s výukou matematiky",
        StrategyDescriptor::matrix_fixed("A6"),
    )]);
    let flow = SessionFlow::new(&test_config(), store);
    let browser = FakeBrowser::new(vec![
        FakePage::matrix("Jak jste spokojeni s výukou matematiky ve škole?", 2, &SCALE),
        FakePage::end(),
    ]);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    // 相似度约 0.81，低于默认阈值 → 人工
    assert_eq!(record.manual_interventions, 1);
    assert!(record.fuzzy_matches.is_empty());

    let mut config = test_config();
    config.fuzzy_threshold = 0.8;
    let store = common::store(vec![(
        "jak jste spokojeni s výukou matematiky",
        StrategyDescriptor::matrix_fixed("A6"),
    )]);
    let flow = SessionFlow::new(&config, store);
    let browser = FakeBrowser::new(vec![
        FakePage::matrix("Jak jste spokojeni s výukou matematiky ve škole?", 2, &SCALE),
        FakePage::end(),
    ]);

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.outcome, Some(SessionOutcome::Completed));
    assert_eq!(record.fuzzy_matches.len(), 1);
    assert_eq!(record.fuzzy_matches[0].matched_key, "jak jste spokojeni s výukou matematiky");
    assert!(record.fuzzy_matches[0].score < 1.0);
}

#[tokio::test]
async fn test_incomplete_fill_routes_to_operator() {
    let store = store(vec![("hodnocení", StrategyDescriptor::matrix_fixed("A6"))]);
    let flow = SessionFlow::new(&test_config(), store);
    let browser = FakeBrowser::new(vec![
        FakePage::matrix("Hodnocení", 2, &["A1", "A2"]),
        FakePage::end(),
    ]);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.outcome, Some(SessionOutcome::Completed));
    assert_eq!(record.manual_interventions, 1);
    assert!(operator.prompts.lock().unwrap()[0].contains("填写不完整"));
}

#[tokio::test]
async fn test_stalled_navigation_fails_session() {
    let store = store(vec![("hodnocení", StrategyDescriptor::skip())]);
    let flow = SessionFlow::new(&test_config(), store);
    let browser = FakeBrowser::new(vec![FakePage::question("Hodnocení").stalled(), FakePage::end()]);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.outcome, Some(SessionOutcome::Failed));
    assert_eq!(record.failure_kind(), Some(FailureKind::NavigationStalled));
    assert_eq!(operator.calls(), 0);
}

#[tokio::test]
async fn test_question_page_without_forward_fails() {
    let store = store(vec![("hodnocení", StrategyDescriptor::skip())]);
    let flow = SessionFlow::new(&test_config(), store);
    let browser = FakeBrowser::new(vec![FakePage::question("Hodnocení").without_forward()]);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.failure_kind(), Some(FailureKind::ForwardMissing));
}

#[tokio::test]
async fn test_control_error_retries_reidentification() {
    let store = store(vec![("hodnocení", StrategyDescriptor::matrix_fixed("A6"))]);
    let flow = SessionFlow::new(&test_config(), store);
    let browser = FakeBrowser::new(vec![FakePage::matrix("Hodnocení", 2, &SCALE), FakePage::end()]);
    browser.fail_next_clicks(1);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.outcome, Some(SessionOutcome::Completed));
    assert_eq!(record.pages_visited, 2);
    assert_eq!(record.manual_interventions, 0);
    assert_eq!(browser.selections(0).len(), 2);
}

#[tokio::test]
async fn test_control_error_fails_after_execution_retries() {
    let mut config = test_config();
    config.execution_retries = 1;
    let store = store(vec![("hodnocení", StrategyDescriptor::matrix_fixed("A6"))]);
    let flow = SessionFlow::new(&config, store);
    let browser = FakeBrowser::new(vec![FakePage::matrix("Hodnocení", 2, &SCALE), FakePage::end()]);
    browser.fail_next_clicks(2);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.outcome, Some(SessionOutcome::Failed));
    assert_eq!(record.failure_kind(), Some(FailureKind::ControlUnavailable));
    assert_eq!(operator.calls(), 0);
}

#[tokio::test]
async fn test_page_limit() {
    let mut config = test_config();
    config.max_pages = 2;
    let store = store(vec![
        ("první", StrategyDescriptor::skip()),
        ("druhá", StrategyDescriptor::skip()),
        ("třetí", StrategyDescriptor::skip()),
    ]);
    let flow = SessionFlow::new(&config, store);
    let browser = FakeBrowser::new(vec![
        FakePage::question("První"),
        FakePage::question("Druhá"),
        FakePage::question("Třetí"),
        FakePage::end(),
    ]);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.failure_kind(), Some(FailureKind::PageLimitExceeded));
    assert_eq!(record.pages_visited, 2);
}

#[tokio::test]
async fn test_repeated_question_routes_to_operator() {
    let store = store(vec![("opakovaná otázka", StrategyDescriptor::skip())]);
    let flow = SessionFlow::new(&test_config(), store);
    let browser = FakeBrowser::new(vec![
        FakePage::question("Opakovaná otázka"),
        FakePage::question("Opakovaná otázka"),
        FakePage::question("Opakovaná otázka"),
        FakePage::end(),
    ]);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.outcome, Some(SessionOutcome::Completed));
    assert_eq!(record.manual_interventions, 1);
    assert!(operator.prompts.lock().unwrap()[0].contains("页面重复出现"));
    assert_eq!(record.strategies_used.get("skip"), Some(&2));
}

#[tokio::test]
async fn test_abort_is_checked_before_next_page() {
    let store = store(vec![("souhlasíte s tvrzením", StrategyDescriptor::matrix_fixed("A6"))]);
    let flow = SessionFlow::new(&test_config(), store);
    let browser = FakeBrowser::new(vec![
        FakePage::question("Neznámá stránka"),
        FakePage::question("Další neznámá"),
        FakePage::end(),
    ]);
    let abort = AbortSignal::new();
    let operator = ScriptedOperator {
        abort_on_resume: Some(abort.clone()),
        ..Default::default()
    };

    let record = flow.run(&browser, &ctx(), &operator, &abort).await;

    assert_eq!(record.outcome, Some(SessionOutcome::Aborted));
    // 人工页面仍然翻过去了，中止在下一页开始前生效
    assert_eq!(browser.current_page(), 1);
    assert_eq!(record.pages_visited, 1);
    assert!(record.failure.is_none());
}

#[tokio::test]
async fn test_random_matrix_toggle() {
    let mut config = test_config();
    config.random_matrix = true;
    let store = store(vec![("hodnocení", StrategyDescriptor::matrix_fixed("A1"))]);
    let flow = SessionFlow::new(&config, Arc::clone(&store));
    let browser = FakeBrowser::new(vec![FakePage::matrix("Hodnocení", 20, &SCALE), FakePage::end()]);
    let operator = ScriptedOperator::default();

    let record = flow.run(&browser, &ctx(), &operator, &AbortSignal::new()).await;

    assert_eq!(record.strategies_used.get("matrix_random"), Some(&1));
    assert!(browser
        .selections(0)
        .iter()
        .all(|(_, code)| ["A5", "A6", "A7"].contains(&code.as_str())));
}

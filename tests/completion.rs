//! Completion tests through the runtime: member candidates after a `.`,
//! general candidates elsewhere

mod common;

use std::time::Duration;

use common::{resolver, variables};
use xfl_editor::autocomplete::{CompletionKind, CompletionRequest, Suggestions};
use xfl_editor::messages::{FormulaMsg, Msg};
use xfl_editor::model::{EditorModel, FunctionContext};
use xfl_editor::runtime::Runtime;

const WAIT: Duration = Duration::from_secs(5);

fn runtime() -> Runtime {
    Runtime::new(EditorModel::default(), resolver())
}

fn labels(suggestions: &Suggestions) -> Vec<String> {
    match suggestions {
        Suggestions::Ready(list) => list.iter().map(|c| c.label.clone()).collect(),
        other => panic!("expected ready suggestions, got {:?}", other),
    }
}

// ========================================================================
// Member Completion
// ========================================================================

#[test]
fn test_members_arrive_after_background_resolve() {
    let mut runtime = runtime();
    let id = runtime.open_formula("%0%.", variables(), vec![]);
    let request = CompletionRequest::new(id, "");

    assert_eq!(runtime.suggest(&request), Suggestions::Pending(None));
    assert!(runtime.run_until_idle(WAIT));

    assert_eq!(labels(&runtime.suggest(&request)), vec!["customer", "id", "total()"]);
}

#[test]
fn test_members_follow_the_chain() {
    let mut runtime = runtime();
    let id = runtime.open_formula("%0%.customer.", variables(), vec![]);
    assert!(runtime.run_until_idle(WAIT));

    let request = CompletionRequest::new(id, "nme");
    assert_eq!(runtime.suggest(&request), Suggestions::Pending(None));
    assert!(runtime.run_until_idle(WAIT));

    let Suggestions::Ready(list) = runtime.suggest(&request) else {
        panic!("members of com.acme.Customer should be cached");
    };
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].insert, ".name");
    assert_eq!(list[0].kind, CompletionKind::Field);
    assert!(list[0].score > 0);
}

#[test]
fn test_method_inserts_open_call() {
    let mut runtime = runtime();
    let id = runtime.open_formula("%0%.", variables(), vec![]);
    let request = CompletionRequest::new(id, "tot");
    runtime.suggest(&request);
    assert!(runtime.run_until_idle(WAIT));

    let Suggestions::Ready(list) = runtime.suggest(&request) else {
        panic!("expected ready suggestions");
    };
    assert_eq!(list[0].label, "total()");
    assert_eq!(list[0].insert, ".total(");
    assert_eq!(list[0].detail.as_deref(), Some("java.math.BigDecimal"));
}

// ========================================================================
// General Completion
// ========================================================================

#[test]
fn test_variables_come_before_functions() {
    let mut runtime = runtime();
    let id = runtime.open_formula("%0%+", variables(), vec![]);

    let all = labels(&runtime.suggest(&CompletionRequest::new(id, "")));
    assert_eq!(&all[..3], ["order", "customer", "lines"]);
    assert!(all.iter().any(|l| l == "substring"));
    assert!(!all.iter().any(|l| l == "glob"));
}

#[test]
fn test_glob_context_offers_glob_functions() {
    let mut runtime = runtime();
    let id = runtime.open_formula("", variables(), vec![]);
    let request = CompletionRequest {
        context: FunctionContext::Glob,
        ..CompletionRequest::new(id, "")
    };

    let all = labels(&runtime.suggest(&request));
    assert!(all.iter().any(|l| l == "glob"));
    assert!(!all.iter().any(|l| l == "substring"));
}

#[test]
fn test_fuzzy_query_narrows_general_candidates() {
    let mut runtime = runtime();
    let id = runtime.open_formula("", variables(), vec![]);

    let Suggestions::Ready(list) = runtime.suggest(&CompletionRequest::new(id, "cust")) else {
        panic!("expected ready suggestions");
    };
    assert_eq!(list[0].label, "customer");
    assert_eq!(list[0].insert, "%1%");
}

#[test]
fn test_closed_formula_is_unavailable() {
    let mut runtime = runtime();
    let id = runtime.open_formula("%0%", variables(), vec![]);
    runtime.dispatch(Msg::Formula(id, FormulaMsg::Close));

    assert_eq!(
        runtime.suggest(&CompletionRequest::new(id, "")),
        Suggestions::Unavailable
    );
}

//! End-to-end interpretation over real processes and a SQLite file store

mod common;

use std::time::{Duration, Instant};

use common::{find_python, harness, open_store, service};
use notebook_core::application::constants::{EXECUTION_ERROR_PREFIX, LAUNCH_ERROR_PREFIX};
use notebook_core::domain::{InterpreterContext, RequestStatus, ResultKind};
use notebook_core::port::{PropertyMap, SessionRepository};

async fn history(store: &notebook_infra_sqlite::SqliteStore, context: &str, id: i64) -> Vec<String> {
    store
        .find_by_context(context)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.id == id)
        .map(|s| s.history)
        .unwrap_or_default()
}

#[tokio::test]
async fn test_python_stateless_print() {
    let Some(python) = find_python() else {
        eprintln!("python3 not found, skipping");
        return;
    };
    let h = harness(
        PropertyMap::new(),
        &[InterpreterContext::new("python", python)],
    )
    .await;

    let result = h.service.execute("%python print(1+1)", None).await;

    assert_eq!(result.kind, ResultKind::Result);
    assert_eq!(result.content, "2");
}

#[tokio::test]
async fn test_python_session_replays_definitions() {
    let Some(python) = find_python() else {
        eprintln!("python3 not found, skipping");
        return;
    };
    let h = harness(
        PropertyMap::new().with("interpreter.python.separator", "\n"),
        &[InterpreterContext::new("python", python)],
    )
    .await;

    assert!(h.service.execute("%python x = 20", Some("5")).await.is_ok());
    assert!(h.service.execute("%python y = x + 1", Some("5")).await.is_ok());
    let result = h.service.execute("%python print(y * 2)", Some("5")).await;

    assert_eq!(result.content, "42");
    assert_eq!(history(&h.store, "python", 5).await, vec!["x = 20", "y = x + 1"]);
}

#[tokio::test]
async fn test_python_traceback_is_error() {
    let Some(python) = find_python() else {
        eprintln!("python3 not found, skipping");
        return;
    };
    let h = harness(
        PropertyMap::new(),
        &[InterpreterContext::new("python", python)],
    )
    .await;

    let result = h.service.execute("%python print(undefined_name)", Some("9")).await;

    assert!(result.is_error());
    assert!(result.content.starts_with(EXECUTION_ERROR_PREFIX));
    assert!(result.content.contains("NameError"));
    assert!(history(&h.store, "python", 9).await.is_empty());
}

#[tokio::test]
async fn test_shell_history_is_ordered_and_replayed() {
    let h = harness(PropertyMap::new(), &[]).await;

    for code in ["%shell A=1", "%shell B=2", "%shell C=$((A + B))"] {
        let result = h.service.execute(code, Some("1")).await;
        assert!(result.is_ok(), "{} failed: {}", code, result.content);
        assert!(result.content.is_empty());
    }
    let result = h.service.execute("%shell echo $C", Some("1")).await;

    assert_eq!(result.content, "3");
    assert_eq!(
        history(&h.store, "shell", 1).await,
        vec!["A=1", "B=2", "C=$((A + B))"]
    );
}

#[tokio::test]
async fn test_terminal_output_is_not_saved() {
    let h = harness(PropertyMap::new(), &[]).await;

    h.service.execute("%shell N=7", Some("2")).await;
    for _ in 0..3 {
        let result = h.service.execute("%shell echo $N", Some("2")).await;
        assert_eq!(result.content, "7");
    }

    assert_eq!(history(&h.store, "shell", 2).await, vec!["N=7"]);
}

#[tokio::test]
async fn test_failing_script_keeps_output_and_history() {
    let h = harness(PropertyMap::new(), &[]).await;

    let result = h
        .service
        .execute("%shell echo partial; exit 3", Some("3"))
        .await;

    assert!(result.is_error());
    assert!(result.content.starts_with(EXECUTION_ERROR_PREFIX));
    assert!(result.content.contains("partial"));
    assert!(history(&h.store, "shell", 3).await.is_empty());
}

#[tokio::test]
async fn test_timeout_is_enforced() {
    let h = harness(
        PropertyMap::new().with("interpreter.shell.timeout", "300"),
        &[],
    )
    .await;
    let start = Instant::now();

    let result = h.service.execute("%shell sleep 10", Some("4")).await;

    assert!(result.is_error());
    assert!(result.content.starts_with(EXECUTION_ERROR_PREFIX));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(history(&h.store, "shell", 4).await.is_empty());
}

#[tokio::test]
async fn test_missing_interpreter_binary_is_launch_error_free() {
    let h = harness(
        PropertyMap::new(),
        &[InterpreterContext::new("python", "/no/such/python3")],
    )
    .await;

    let result = h.service.execute("%python print(1)", None).await;

    // Construction fails before any launch is attempted
    assert!(result.is_error());
    assert!(!result.content.starts_with(LAUNCH_ERROR_PREFIX));
}

#[tokio::test]
async fn test_unknown_language_leaves_no_trace() {
    let h = harness(PropertyMap::new(), &[]).await;

    let mut request = h
        .service
        .classify_and_validate("%unknownlang x=1", Some("10"))
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::NoInterpreterFound);

    let result = h.service.dispatch(&mut request).await;

    assert!(result.is_error());
    assert!(h.store.find_by_context("unknownlang").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_syntax_names_pattern() {
    let h = harness(PropertyMap::new(), &[]).await;

    for raw in ["%python123 print(1+1)", "echo hi", "%shell", ""] {
        let result = h.service.execute(raw, None).await;
        assert!(result.is_error());
        assert!(result.content.starts_with("Couldn't parse input code"));
    }
}

#[tokio::test]
async fn test_sessions_survive_reopen() {
    let h = harness(PropertyMap::new(), &[]).await;
    h.service.execute("%shell GREETING=hello", Some("11")).await;

    let reopened = open_store(h.dir.path()).await;
    let restarted = service(reopened.clone(), PropertyMap::new());
    let result = restarted.execute("%shell echo $GREETING", Some("11")).await;

    assert_eq!(result.content, "hello");
    assert_eq!(history(&reopened, "shell", 11).await, vec!["GREETING=hello"]);
}

//! Persistent REPL session behavior.

use pretty_assertions::assert_eq;
use zen::{CollectStringPrint, ExecError, Object, ReplSession};

#[test]
fn globals_persist_across_inputs() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    session.execute("set x = 10", &mut print).unwrap();
    session.execute("set y = x * 2", &mut print).unwrap();
    let result = session.execute("x + y", &mut print).unwrap();
    assert_eq!(result, Object::Number(30.0));
}

#[test]
fn functions_persist_and_outlive_their_defining_input() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    session.execute("function twice(n) { return n * 2 }", &mut print).unwrap();
    // the defining input's AST is long gone by now
    let result = session.execute("twice(21)", &mut print).unwrap();
    assert_eq!(result, Object::Number(42.0));
}

#[test]
fn closures_survive_between_inputs() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    session
        .execute(
            "function counter() { set n = 0 function inc() { set n = n + 1 return n } return inc }",
            &mut print,
        )
        .unwrap();
    session.execute("set c = counter()", &mut print).unwrap();
    assert_eq!(session.execute("c()", &mut print).unwrap(), Object::Number(1.0));
    assert_eq!(session.execute("c()", &mut print).unwrap(), Object::Number(2.0));
}

#[test]
fn session_continues_after_runtime_errors() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    session.execute("set x = 5", &mut print).unwrap();
    let err = session.execute("1 / 0", &mut print);
    assert!(matches!(err, Err(ExecError::Runtime(_))));
    // the error did not damage the session
    assert_eq!(session.execute("x", &mut print).unwrap(), Object::Number(5.0));
}

#[test]
fn session_continues_after_syntax_errors() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    session.execute("set x = 1", &mut print).unwrap();
    assert!(matches!(
        session.execute("set = nope", &mut print),
        Err(ExecError::Syntax(_))
    ));
    assert_eq!(session.execute("x + 1", &mut print).unwrap(), Object::Number(2.0));
}

#[test]
fn render_result_suppresses_null() {
    assert_eq!(ReplSession::render_result(&Object::Null), None);
    assert_eq!(ReplSession::render_result(&Object::Number(3.0)), Some("3".into()));
    assert_eq!(
        ReplSession::render_result(&Object::String("hi".into())),
        Some("hi".into())
    );
}

#[test]
fn print_returns_suppressed_null() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    let result = session.execute("print(\"shown\")", &mut print).unwrap();
    assert_eq!(ReplSession::render_result(&result), None);
    assert_eq!(print.output(), "shown\n");
}

#[test]
fn top_level_return_unwraps_for_display() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    let result = session.execute("return 7", &mut print).unwrap();
    assert_eq!(ReplSession::render_result(&result), Some("7".into()));
}

#[test]
fn list_variables_reports_definition_order() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    session.execute("set first = 1 set second = \"two\"", &mut print).unwrap();
    let vars = session.list_variables();
    assert_eq!(vars[0], ("first".to_owned(), "1".to_owned()));
    assert_eq!(vars[1], ("second".to_owned(), "two".to_owned()));
}

#[test]
fn dropping_the_session_releases_everything() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    session.execute("set data = [1, 2, 3]", &mut print).unwrap();
    session.execute("set text = \"kept\"", &mut print).unwrap();
    let stats = session.into_heap_stats();
    assert_eq!(stats.live_objects, 0);
}

#[test]
fn heap_stats_track_session_growth() {
    let mut print = CollectStringPrint::new();
    let mut session = ReplSession::new();
    let before = session.heap_stats().live_objects;
    session.execute("set a = [1, 2]", &mut print).unwrap();
    let after = session.heap_stats().live_objects;
    assert_eq!(after, before + 1);
}

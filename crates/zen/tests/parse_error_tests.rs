//! Parser error reporting and the refuse-to-evaluate contract.

use zen::{CollectStringPrint, ExecError, Interpreter};

fn syntax_errors(source: &str) -> Vec<zen::SyntaxError> {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    match interp.run(source, &mut print) {
        Err(ExecError::Syntax(errors)) => errors,
        other => panic!("expected syntax errors, got {other:?}"),
    }
}

#[test]
fn malformed_input_reports_location() {
    let errors = syntax_errors("set = 5");
    assert_eq!(errors.len(), 1);
    assert_eq!((errors[0].line, errors[0].column), (1, 5));
    assert!(errors[0].message.contains("expected"));
}

#[test]
fn multiple_errors_are_accumulated() {
    let errors = syntax_errors("set = 1\nset ok = 2\nif { }\nwhile");
    assert!(errors.len() >= 2, "got: {errors:?}");
    // errors appear in source order
    assert!(errors[0].line < errors[1].line);
}

#[test]
fn no_statement_is_evaluated_when_any_error_exists() {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    // the print statement is valid but must not run
    let result = interp.run("print(\"ran\")\nset = broken", &mut print);
    assert!(matches!(result, Err(ExecError::Syntax(_))));
    assert_eq!(print.output(), "");
}

#[test]
fn session_state_is_untouched_by_rejected_input() {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    interp.run("set x = 1", &mut print).unwrap();
    let _ = interp.run("set x = )", &mut print);
    interp.run("print(x)", &mut print).unwrap();
    assert_eq!(print.output(), "1\n");
}

#[test]
fn unterminated_string() {
    let errors = syntax_errors("set s = \"oops");
    assert!(errors.iter().any(|e| e.message.contains("unterminated string")));
}

#[test]
fn unknown_escape() {
    let errors = syntax_errors(r#"set s = "a\qb""#);
    assert!(errors.iter().any(|e| e.message.contains("escape")));
}

#[test]
fn unexpected_character() {
    let errors = syntax_errors("set x = 1 @ 2");
    assert!(errors.iter().any(|e| e.message.contains("unrecognized character")));
}

#[test]
fn missing_brace() {
    let errors = syntax_errors("if true { print(1)");
    assert!(!errors.is_empty());
}

#[test]
fn error_display_includes_position() {
    let errors = syntax_errors("set = 5");
    let rendered = errors[0].to_string();
    assert!(rendered.starts_with("1:5:"), "got: {rendered}");
}

//! JSON round-trips and cycle handling.

use pretty_assertions::assert_eq;
use zen::{CollectStringPrint, Interpreter, Object};

fn run_result(source: &str) -> Object {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    interp.run(source, &mut print).expect("program should succeed")
}

fn run_output(source: &str) -> String {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    interp.run(source, &mut print).expect("program should succeed");
    print.into_output()
}

#[test]
fn stringify_forms() {
    assert_eq!(run_result("jsonStringify(null)"), Object::String("null".into()));
    assert_eq!(run_result("jsonStringify(true)"), Object::String("true".into()));
    assert_eq!(run_result("jsonStringify(1.5)"), Object::String("1.5".into()));
    assert_eq!(run_result("jsonStringify(3.0)"), Object::String("3".into()));
    assert_eq!(run_result("jsonStringify(\"a\\\"b\")"), Object::String("\"a\\\"b\"".into()));
    assert_eq!(
        run_result("jsonStringify([1, \"two\", null])"),
        Object::String("[1,\"two\",null]".into())
    );
    assert_eq!(
        run_result("jsonStringify({a: 1, b: [true]})"),
        Object::String("{\"a\":1,\"b\":[true]}".into())
    );
}

#[test]
fn non_finite_numbers_serialize_as_null() {
    assert_eq!(run_result("jsonStringify(toNumber(\"NaN\"))"), Object::String("null".into()));
    assert_eq!(
        run_result("jsonStringify([toNumber(\"Infinity\")])"),
        Object::String("[null]".into())
    );
}

#[test]
fn parse_forms() {
    assert_eq!(run_result("jsonParse(\"42\")"), Object::Number(42.0));
    assert_eq!(run_result("jsonParse(\"null\")"), Object::Null);
    assert_eq!(
        run_result("jsonParse(\"[1, 2]\")"),
        Object::List(vec![Object::Number(1.0), Object::Number(2.0)])
    );
}

#[test]
fn parse_preserves_key_order() {
    assert_eq!(
        run_output("print(keys(jsonParse(\"{\\\"z\\\": 1, \\\"a\\\": 2}\")))"),
        "[\"z\", \"a\"]\n"
    );
}

#[test]
fn parse_failure_is_an_error_value_channel() {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    let err = interp.run("jsonParse(\"{oops\")", &mut print);
    assert!(err.is_err(), "malformed JSON must fail");
}

#[test]
fn round_trip_over_representable_values() {
    let sources = [
        "null",
        "true",
        "false",
        "0",
        "-12.5",
        "\"text with \\\"quotes\\\"\"",
        "[1, [2, [3]], \"x\"]",
        "{a: null, b: [1, 2], c: {d: false}}",
        "[]",
        "{}",
    ];
    for value in sources {
        let source = format!("set v = {value} jsonParse(jsonStringify(v)) == v");
        assert_eq!(run_result(&source), Object::Bool(true), "round-trip failed for {value}");
    }
}

#[test]
fn cyclic_array_stringifies_with_sentinel() {
    let result = run_result("set a = [1, 2] push(a, a) jsonStringify(a)");
    match result {
        Object::String(s) => {
            assert!(s.contains("[Circular Reference]"), "got: {s}");
            assert!(s.starts_with('['), "got: {s}");
        }
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn cyclic_object_stringifies_with_sentinel() {
    let result = run_result("set o = {} o[\"self\"] = o jsonStringify(o)");
    match result {
        Object::String(s) => assert!(s.contains("[Circular Reference]"), "got: {s}"),
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn shared_but_acyclic_values_are_not_flagged() {
    // the same array referenced twice is shared, not cyclic
    let result = run_result("set shared = [1] jsonStringify([shared, shared])");
    assert_eq!(result, Object::String("[[1],[1]]".into()));
}

#[test]
fn cyclic_display_also_terminates() {
    let output = run_output("set a = [] push(a, a) print(a)");
    assert!(output.contains("[Circular Reference]"), "got: {output}");
}

#[test]
fn escapes_round_trip() {
    let source = "set s = \"line\\nbreak\\ttab\\u00e9\" jsonParse(jsonStringify(s)) == s";
    assert_eq!(run_result(source), Object::Bool(true));
}

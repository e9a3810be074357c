//! End-to-end evaluation behavior through the public API.

use pretty_assertions::assert_eq;
use zen::{CollectStringPrint, ErrorKind, ExecError, Interpreter, Object};

fn run(source: &str) -> (Object, String) {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    let result = interp.run(source, &mut print);
    match result {
        Ok(object) => (object, print.into_output()),
        Err(err) => panic!("program failed: {err}\nsource: {source}"),
    }
}

fn run_output(source: &str) -> String {
    run(source).1
}

fn run_result(source: &str) -> Object {
    run(source).0
}

fn run_error(source: &str) -> zen::ZenError {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    match interp.run(source, &mut print) {
        Err(ExecError::Runtime(err)) => err,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

#[test]
fn arithmetic_and_print() {
    assert_eq!(run_output("set x = 1 + 2 print(x)"), "3\n");
}

#[test]
fn function_call() {
    assert_eq!(run_output("function sq(n) { return n * n } print(sq(9))"), "81\n");
}

#[test]
fn closure_counter() {
    let source = "function counter() { set n = 0 function inc() { set n = n + 1 return n } return inc } \
                  set c = counter() print(c()) print(c())";
    assert_eq!(run_output(source), "1\n2\n");
}

#[test]
fn for_over_array() {
    assert_eq!(run_output("set a = [10, 20, 30] for x in a { print(x) }"), "10\n20\n30\n");
}

#[test]
fn division_by_zero_is_captured_by_set() {
    let output = run_output("set r = 1 / 0 print(r)");
    assert!(output.contains("division by zero"), "got: {output}");
    assert!(output.contains("Error(4)"), "got: {output}");
}

#[test]
fn circular_object_serializes_with_sentinel() {
    let output = run_output("set o = {} o[\"k\"] = o print(jsonStringify(o))");
    assert!(output.contains("[Circular Reference]"), "got: {output}");
}

#[test]
fn upper_builtin() {
    assert_eq!(run_output("set s = \"hello\" print(upper(s))"), "HELLO\n");
}

#[test]
fn operator_precedence() {
    assert_eq!(run_result("1 + 2 * 3"), Object::Number(7.0));
    assert_eq!(run_result("(1 + 2) * 3"), Object::Number(9.0));
    assert_eq!(run_result("10 % 4"), Object::Number(2.0));
    assert_eq!(run_result("2 < 3 and 3 < 2"), Object::Bool(false));
}

#[test]
fn string_concatenation_and_coercion() {
    assert_eq!(run_result("\"a\" + \"b\""), Object::String("ab".into()));
    assert_eq!(run_result("\"n=\" + 3"), Object::String("n=3".into()));
    assert_eq!(run_result("3 + \"!\""), Object::String("3!".into()));
}

#[test]
fn comparison_rules() {
    assert_eq!(run_result("\"abc\" < \"abd\""), Object::Bool(true));
    assert_eq!(run_result("\"b\" >= \"a\""), Object::Bool(true));
    let err = run_error("1 < \"a\"");
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn structural_equality() {
    assert_eq!(run_result("[1, [2, 3]] == [1, [2, 3]]"), Object::Bool(true));
    assert_eq!(run_result("{a: 1} == {a: 1}"), Object::Bool(true));
    assert_eq!(run_result("{a: 1} == {a: 2}"), Object::Bool(false));
    assert_eq!(run_result("null == null"), Object::Bool(true));
    assert_eq!(run_result("1 != 2"), Object::Bool(true));
}

#[test]
fn nan_is_not_equal_to_itself() {
    assert_eq!(run_result("set n = toNumber(\"NaN\") n == n"), Object::Bool(false));
}

#[test]
fn equality_is_reflexive_for_non_nan() {
    for expr in ["42", "\"text\"", "[1, 2]", "{k: [true]}", "null", "false"] {
        let source = format!("set x = {expr} x == x");
        assert_eq!(run_result(&source), Object::Bool(true), "failed for {expr}");
    }
}

#[test]
fn short_circuit_keeps_operand_value() {
    assert_eq!(run_result("5 or 10"), Object::Number(5.0));
    assert_eq!(run_result("0 or 10"), Object::Number(10.0));
    assert_eq!(run_result("0 and 10"), Object::Number(0.0));
    assert_eq!(run_result("5 and 10"), Object::Number(10.0));
}

#[test]
fn short_circuit_skips_side_effects() {
    let source = "set calls = 0 \
                  function bump() { set calls = calls + 1 return true } \
                  set a = true or bump() \
                  set b = false and bump() \
                  print(calls)";
    assert_eq!(run_output(source), "0\n");
}

#[test]
fn ternary_evaluates_single_arm() {
    let source = "set calls = 0 \
                  function bump() { set calls = calls + 1 return 1 } \
                  set x = true ? 10 : bump() \
                  print(x) print(calls)";
    assert_eq!(run_output(source), "10\n0\n");
}

#[test]
fn while_loop_with_break_and_continue() {
    let source = "set i = 0 set total = 0 \
                  while true { \
                      i = i + 1 \
                      if i > 10 { break } \
                      if i % 2 == 0 { continue } \
                      total = total + i \
                  } \
                  print(total)";
    assert_eq!(run_output(source), "25\n");
}

#[test]
fn for_over_string_and_object() {
    assert_eq!(run_output("for c in \"abc\" { print(c) }"), "a\nb\nc\n");
    assert_eq!(
        run_output("set o = {x: 1, y: 2} for k in o { print(k, o[k]) }"),
        "x 1\ny 2\n"
    );
}

#[test]
fn for_loop_body_mutating_the_array_does_not_crash() {
    let source = "set a = [1, 2, 3, 4] set seen = 0 \
                  for x in a { seen = seen + 1 pop(a) } \
                  print(seen)";
    assert_eq!(run_output(source), "2\n");
}

#[test]
fn array_index_and_mutation() {
    assert_eq!(run_output("set a = [1, 2] a[0] = 9 print(a)"), "[9, 2]\n");
    let err = run_error("set a = [1] a[5]");
    assert_eq!(err.kind(), ErrorKind::Bounds);
    let err = run_error("set a = [1] a[3] = 0");
    assert_eq!(err.kind(), ErrorKind::Bounds);
}

#[test]
fn object_access_rules() {
    // reading an absent key yields null, assignment creates it
    assert_eq!(run_result("set o = {} o[\"missing\"]"), Object::Null);
    assert_eq!(run_output("set o = {} o.name = \"zen\" print(o.name)"), "zen\n");
    let err = run_error("set n = 5 n.field");
    assert_eq!(err.kind(), ErrorKind::Bounds);
}

#[test]
fn object_insertion_order_is_preserved() {
    assert_eq!(
        run_output("set o = {b: 1, a: 2} o[\"c\"] = 3 print(o)"),
        "{\"b\": 1, \"a\": 2, \"c\": 3}\n"
    );
}

#[test]
fn string_indexing() {
    assert_eq!(run_result("\"zen\"[1]"), Object::String("e".into()));
    let err = run_error("\"zen\"[9]");
    assert_eq!(err.kind(), ErrorKind::Bounds);
}

#[test]
fn undefined_symbols() {
    assert_eq!(run_error("missing").kind(), ErrorKind::UndefinedSymbol);
    assert_eq!(run_error("missing()").kind(), ErrorKind::UndefinedSymbol);
    assert_eq!(run_error("set x = 1 x()").kind(), ErrorKind::UndefinedSymbol);
}

#[test]
fn parameter_binding() {
    // missing parameters bind null, extra arguments are ignored
    assert_eq!(
        run_output("function f(a, b) { print(a, b) } f(1) f(1, 2, 3)"),
        "1 null\n1 2\n"
    );
}

#[test]
fn error_values_propagate_through_operators() {
    let err = run_error("set r = 1 / 0 r + 1");
    assert_eq!(err.kind(), ErrorKind::Arithmetic);
    let err = run_error("set r = 1 / 0 if r { print(1) }");
    assert_eq!(err.kind(), ErrorKind::Arithmetic);
}

#[test]
fn error_values_flow_into_inspection_builtins() {
    assert_eq!(run_output("set r = 1 / 0 print(typeOf(r))"), "error\n");
    let output = run_output("set r = 1 / 0 print(toString(r))");
    assert!(output.starts_with("Error(4)"), "got: {output}");
}

#[test]
fn truthiness_in_conditions() {
    let source = "set hits = 0 \
                  if \"\" { hits = hits + 1 } \
                  if \"x\" { hits = hits + 10 } \
                  if [] { hits = hits + 100 } \
                  if [0] { hits = hits + 1000 } \
                  if null { hits = hits + 10000 } \
                  print(hits)";
    assert_eq!(run_output(source), "1010\n");
}

#[test]
fn not_and_negation() {
    assert_eq!(run_result("not true"), Object::Bool(false));
    assert_eq!(run_result("not 0"), Object::Bool(true));
    assert_eq!(run_result("-(2 + 3)"), Object::Number(-5.0));
    assert_eq!(run_error("-\"x\"").kind(), ErrorKind::TypeMismatch);
}

#[test]
fn recursion_works_and_is_bounded() {
    assert_eq!(
        run_output("function fib(n) { if n < 2 { return n } return fib(n - 1) + fib(n - 2) } print(fib(15))"),
        "610\n"
    );
    let err = run_error("function f() { return f() } f()");
    assert_eq!(err.kind(), ErrorKind::Resource);
}

#[test]
fn break_outside_loop_is_an_error() {
    assert_eq!(run_error("break").kind(), ErrorKind::Syntax);
    assert_eq!(run_error("function f() { continue } f()").kind(), ErrorKind::Syntax);
}

#[test]
fn top_level_return_unwraps() {
    assert_eq!(run_result("return 41 + 1"), Object::Number(42.0));
}

#[test]
fn number_display_forms() {
    assert_eq!(run_output("print(3.0)"), "3\n");
    assert_eq!(run_output("print(0.5)"), "0.5\n");
    assert_eq!(run_output("print(1 / 4)"), "0.25\n");
    assert_eq!(run_output("print(toNumber(\"Infinity\"))"), "Infinity\n");
}

#[test]
fn conversion_builtins() {
    assert_eq!(run_result("toNumber(\"0x1f\")"), Object::Number(31.0));
    assert_eq!(run_result("toNumber(\"0b101\")"), Object::Number(5.0));
    assert_eq!(run_result("toNumber(true)"), Object::Number(1.0));
    assert_eq!(run_result("toNumber(null)"), Object::Number(0.0));
    assert_eq!(run_result("parseInt(\"2f\", 16)"), Object::Number(47.0));
    assert_eq!(run_result("typeOf([])"), Object::String("array".into()));
    assert_eq!(run_result("typeOf(typeOf)"), Object::String("function".into()));
}

#[test]
fn array_builtins() {
    assert_eq!(run_output("set a = [3, 1, 2] sort(a) print(a)"), "[1, 2, 3]\n");
    assert_eq!(run_output("print(sort([\"b\", \"a\"]))"), "[\"a\", \"b\"]\n");
    assert_eq!(run_result("len(range(2, 10, 2))"), Object::Number(4.0));
    assert_eq!(run_output("print(range(3))"), "[0, 1, 2]\n");
    assert_eq!(run_output("print(slice([1, 2, 3, 4], 1, 3))"), "[2, 3]\n");
    assert_eq!(run_output("print(concat([1], [2, 3]))"), "[1, 2, 3]\n");
    assert_eq!(
        run_output("set o = {a: 1, b: 2} print(keys(o)) print(values(o))"),
        "[\"a\", \"b\"]\n[1, 2]\n"
    );
    assert_eq!(run_output("set a = [1] push(a, 2) print(pop(a), a)"), "2 [1]\n");
}

#[test]
fn string_builtins() {
    assert_eq!(run_result("join(split(\"a,b,c\", \",\"), \"-\")"), Object::String("a-b-c".into()));
    assert_eq!(run_result("substring(\"hello\", 1, 3)"), Object::String("el".into()));
    assert_eq!(run_result("replace(\"aaa\", \"a\", \"b\")"), Object::String("bbb".into()));
    assert_eq!(run_result("indexOf(\"hello\", \"llo\")"), Object::Number(2.0));
    assert_eq!(run_result("indexOf([10, 20], 20)"), Object::Number(1.0));
    assert_eq!(run_result("contains(\"hello\", \"ell\")"), Object::Bool(true));
    assert_eq!(run_result("len(\"héllo\")"), Object::Number(6.0));
}

#[test]
fn set_and_priority_queue_builtins() {
    let source = "set s = setNew() \
                  print(setAdd(s, [1, 2])) print(setAdd(s, [1, 2])) \
                  print(setHas(s, [1, 2])) print(setSize(s)) \
                  print(setRemove(s, [1, 2])) print(setSize(s))";
    assert_eq!(run_output(source), "true\nfalse\ntrue\n1\ntrue\n0\n");

    let source = "set q = pqNew() \
                  pqPush(q, 2, \"second\") pqPush(q, 1, \"first\") pqPush(q, 3, \"third\") \
                  print(pqPop(q)) print(pqPeek(q)) print(pqSize(q))";
    assert_eq!(run_output(source), "first\nsecond\n2\n");
}

#[test]
fn seeded_random_is_deterministic() {
    let source = "seed(7) set a = random() seed(7) set b = random() print(a == b)";
    assert_eq!(run_output(source), "true\n");
}

#[test]
fn builtins_reject_bad_arguments() {
    assert_eq!(run_error("upper(5)").kind(), ErrorKind::ArgumentMismatch);
    assert_eq!(run_error("upper()").kind(), ErrorKind::ArgumentMismatch);
    assert_eq!(run_error("sqrt(-1)").kind(), ErrorKind::Arithmetic);
    assert_eq!(run_error("len(5)").kind(), ErrorKind::ArgumentMismatch);
}

#[test]
fn callable_values() {
    // builtins and user functions are first-class through variables
    assert_eq!(run_output("set p = print p(\"via value\")"), "via value\n");
    assert_eq!(
        run_output("function double(n) { return n * 2 } set d = double print(d(21))"),
        "42\n"
    );
}

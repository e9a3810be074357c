//! Reference-count integrity: after evaluation and release of the global
//! scope, no values remain on the heap.

use pretty_assertions::assert_eq;
use zen::{CollectStringPrint, Interpreter};

fn assert_clean_after(source: &str) {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    let result = interp.run(source, &mut print);
    assert!(result.is_ok(), "program failed: {result:?}\nsource: {source}");
    let stats = interp.into_heap_stats();
    assert_eq!(stats.live_objects, 0, "leaked objects: {stats:?}\nsource: {source}");
}

#[test]
fn literals_and_temporaries() {
    assert_clean_after("1 + 2");
    assert_clean_after("\"a\" + \"b\" + \"c\"");
    assert_clean_after("[1, [2, 3], {k: \"v\"}]");
}

#[test]
fn bindings_released_with_the_global_scope() {
    assert_clean_after("set a = [1, 2, 3] set o = {x: a} set s = \"text\"");
}

#[test]
fn overwritten_bindings_release_the_previous_value() {
    assert_clean_after("set a = [1, 2] a = [3, 4] a = 5");
    assert_clean_after("set o = {k: [1]} o[\"k\"] = [2] o[\"k\"] = null");
}

#[test]
fn loops_do_not_accumulate() {
    assert_clean_after("set i = 0 while i < 100 { set tmp = [i, \"x\" + i] i = i + 1 }");
    assert_clean_after("for x in range(50) { set copy = [x] }");
}

#[test]
fn call_frames_released_on_normal_return() {
    assert_clean_after("function f(n) { set local = [n, n] return n } f(1) f(2) f(3)");
}

#[test]
fn call_frames_released_on_error_paths() {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    // three nested calls, each with locals, failing at the innermost level
    let source = "function a() { set la = [1] return b() } \
                  function b() { set lb = [2] return c() } \
                  function c() { set lc = [3] return 1 / 0 } \
                  a()";
    let result = interp.run(source, &mut print);
    assert!(result.is_err(), "expected the error to propagate");
    let stats = interp.into_heap_stats();
    assert_eq!(stats.live_objects, 0, "frames leaked on the error path: {stats:?}");
}

#[test]
fn captured_errors_are_owned_by_their_binding() {
    assert_clean_after("set r = 1 / 0 set s = toString(r)");
}

#[test]
fn builtin_results_are_released() {
    assert_clean_after("upper(\"x\") split(\"a,b\", \",\") jsonStringify({a: [1, 2]})");
    assert_clean_after("set parsed = jsonParse(\"[1, {\\\"k\\\": null}]\")");
}

#[test]
fn container_builtins_balance_their_references() {
    assert_clean_after(
        "set s = setNew() setAdd(s, \"a\") setAdd(s, \"a\") setRemove(s, \"a\") \
         set q = pqNew() pqPush(q, 1, [1, 2]) pqPop(q) pqPush(q, 2, \"kept\")",
    );
}

#[test]
fn set_stats_report_live_objects() {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    interp.run("set a = [1] set b = \"s\"", &mut print).unwrap();
    let stats = interp.heap_stats();
    // global frame + array + string
    assert_eq!(stats.live_objects, 3);
    assert_eq!(stats.objects_by_type.get("array"), Some(&1));
    assert_eq!(stats.objects_by_type.get("string"), Some(&1));
    assert_eq!(stats.objects_by_type.get("frame"), Some(&1));
}

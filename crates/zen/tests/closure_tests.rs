//! Closure capture and scope lifetime behavior.

use pretty_assertions::assert_eq;
use zen::{CollectStringPrint, Interpreter};

fn run_output(source: &str) -> String {
    let mut print = CollectStringPrint::new();
    let mut interp = Interpreter::new();
    interp.run(source, &mut print).expect("program should succeed");
    print.into_output()
}

#[test]
fn capture_survives_the_defining_call() {
    let source = "function make(greeting) { \
                      function greet(name) { return greeting + \", \" + name } \
                      return greet \
                  } \
                  set hello = make(\"hello\") \
                  print(hello(\"world\"))";
    assert_eq!(run_output(source), "hello, world\n");
}

#[test]
fn two_closures_share_one_environment() {
    let source = "function pair() { \
                      set n = 0 \
                      function inc() { set n = n + 1 return n } \
                      function get() { return n } \
                      return [inc, get] \
                  } \
                  set fns = pair() \
                  set inc = fns[0] set get = fns[1] \
                  inc() inc() \
                  print(get())";
    assert_eq!(run_output(source), "2\n");
}

#[test]
fn separate_calls_get_separate_environments() {
    let source = "function counter() { set n = 0 function inc() { set n = n + 1 return n } return inc } \
                  set a = counter() set b = counter() \
                  a() a() \
                  print(a()) print(b())";
    assert_eq!(run_output(source), "3\n1\n");
}

#[test]
fn nested_closures_reach_through_all_frames() {
    let source = "function outer() { \
                      set base = 100 \
                      function middle() { \
                          set offset = 10 \
                          function inner() { return base + offset + 1 } \
                          return inner \
                      } \
                      return middle() \
                  } \
                  set f = outer() \
                  print(f())";
    assert_eq!(run_output(source), "111\n");
}

#[test]
fn closure_observes_later_mutation_of_the_captured_frame() {
    let source = "set x = 1 \
                  function show() { return x } \
                  x = 2 \
                  print(show())";
    assert_eq!(run_output(source), "2\n");
}

#[test]
fn recursive_closure_via_its_own_name() {
    let source = "function make() { \
                      function down(n) { if n == 0 { return \"done\" } return down(n - 1) } \
                      return down \
                  } \
                  set f = make() \
                  print(f(5))";
    assert_eq!(run_output(source), "done\n");
}

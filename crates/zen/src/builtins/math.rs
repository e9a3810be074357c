//! Numeric builtins. Domain violations produce Arithmetic errors.

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{as_int, as_number, Args};
use crate::{
    error::{ErrorKind, RunResult},
    heap::Heap,
    value::Value,
};

fn unary_number(heap: &mut Heap, args: Args, name: &str, apply: impl FnOnce(f64) -> f64) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, name)?;
    let n = as_number(&value, heap, name);
    value.drop_with_heap(heap);
    Ok(Value::Number(apply(n?)))
}

pub(super) fn abs(heap: &mut Heap, args: Args) -> RunResult<Value> {
    unary_number(heap, args, "abs", f64::abs)
}

pub(super) fn floor(heap: &mut Heap, args: Args) -> RunResult<Value> {
    unary_number(heap, args, "floor", f64::floor)
}

pub(super) fn ceil(heap: &mut Heap, args: Args) -> RunResult<Value> {
    unary_number(heap, args, "ceil", f64::ceil)
}

pub(super) fn round(heap: &mut Heap, args: Args) -> RunResult<Value> {
    unary_number(heap, args, "round", f64::round)
}

pub(super) fn sqrt(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "sqrt")?;
    let n = as_number(&value, heap, "sqrt");
    value.drop_with_heap(heap);
    let n = n?;
    if n < 0.0 {
        return Err(ErrorKind::Arithmetic.err(format!("sqrt() of negative number {}", crate::value::format_number(n))));
    }
    Ok(Value::Number(n.sqrt()))
}

pub(super) fn pow(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [base_value, exp_value] = args.into_exact::<2>(heap, "pow")?;
    let extracted =
        as_number(&base_value, heap, "pow").and_then(|base| as_number(&exp_value, heap, "pow").map(|exp| (base, exp)));
    base_value.drop_with_heap(heap);
    exp_value.drop_with_heap(heap);
    let (base, exp) = extracted?;
    Ok(Value::Number(base.powf(exp)))
}

pub(super) fn min(heap: &mut Heap, args: Args) -> RunResult<Value> {
    fold_numbers(heap, args, "min", f64::min)
}

pub(super) fn max(heap: &mut Heap, args: Args) -> RunResult<Value> {
    fold_numbers(heap, args, "max", f64::max)
}

fn fold_numbers(heap: &mut Heap, args: Args, name: &str, fold: impl Fn(f64, f64) -> f64) -> RunResult<Value> {
    let values = args.into_at_least(heap, name, 1)?;
    let numbers: RunResult<Vec<f64>> = values.iter().map(|v| as_number(v, heap, name)).collect();
    for value in values {
        value.drop_with_heap(heap);
    }
    let numbers = numbers?;
    let mut result = numbers[0];
    for n in &numbers[1..] {
        result = fold(result, *n);
    }
    Ok(Value::Number(result))
}

pub(super) fn random(heap: &mut Heap, rng: &mut StdRng, args: Args) -> RunResult<Value> {
    let [] = args.into_exact::<0>(heap, "random")?;
    Ok(Value::Number(rng.gen::<f64>()))
}

pub(super) fn seed(heap: &mut Heap, rng: &mut StdRng, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "seed")?;
    let n = as_int(&value, heap, "seed");
    value.drop_with_heap(heap);
    *rng = StdRng::seed_from_u64(n? as u64);
    Ok(Value::Null)
}

//! Conversion and introspection builtins.

use super::{as_number, as_string, Args};
use crate::{
    error::{ErrorKind, RunResult},
    heap::{Heap, HeapData},
    value::{self, Value},
};

pub(super) fn len(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "len")?;
    let length = match &value {
        Value::Ref(id) => match heap.get(*id) {
            HeapData::Str(s) => Some(s.len()),
            HeapData::List(list) => Some(list.len()),
            HeapData::Object(object) => Some(object.len()),
            HeapData::Set(set) => Some(set.len()),
            HeapData::PriorityQueue(queue) => Some(queue.len()),
            _ => None,
        },
        _ => None,
    };
    let type_name = value.type_name(heap);
    value.drop_with_heap(heap);
    match length {
        Some(length) => Ok(Value::Number(length as f64)),
        None => Err(ErrorKind::ArgumentMismatch.err(format!("len() not defined for {type_name}"))),
    }
}

pub(super) fn type_of(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "typeOf")?;
    let name = value.type_name(heap);
    value.drop_with_heap(heap);
    heap.alloc_str(name)
}

pub(super) fn to_string(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "toString")?;
    let rendered = value.display_string(heap);
    value.drop_with_heap(heap);
    heap.alloc_str(rendered)
}

pub(super) fn to_number(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "toNumber")?;
    let number = value::value_to_number(&value, heap);
    value.drop_with_heap(heap);
    Ok(Value::Number(number))
}

pub(super) fn to_boolean(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "toBoolean")?;
    let truthy = value.truthy(heap);
    value.drop_with_heap(heap);
    Ok(Value::Bool(truthy))
}

pub(super) fn parse_int(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let mut values = args.into_between(heap, "parseInt", 1, 2)?;
    let radix_value = if values.len() == 2 { values.pop() } else { None };
    let text_value = values.pop().expect("arity checked");

    let extracted = as_string(&text_value, heap, "parseInt").and_then(|text| {
        let radix = match &radix_value {
            Some(value) => {
                let radix = as_number(value, heap, "parseInt")?;
                if radix.fract() != 0.0 || !(2.0..=36.0).contains(&radix) {
                    return Err(ErrorKind::ArgumentMismatch.err("parseInt() radix must be an integer in 2..36"));
                }
                radix as u32
            }
            None => 10,
        };
        Ok((text, radix))
    });
    text_value.drop_with_heap(heap);
    if let Some(value) = radix_value {
        value.drop_with_heap(heap);
    }
    let (text, radix) = extracted?;
    Ok(Value::Number(parse_int_text(&text, radix)))
}

/// Parses leading integer digits in the given radix, ignoring surrounding
/// whitespace and any trailing garbage. NaN when no digit is present.
fn parse_int_text(text: &str, radix: u32) -> f64 {
    let trimmed = text.trim();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1.0, &trimmed[1..]),
        Some(b'-') => (-1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    let rest = if radix == 16 {
        rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")).unwrap_or(rest)
    } else {
        rest
    };
    let mut value = 0.0f64;
    let mut seen = false;
    for ch in rest.chars() {
        let Some(digit) = ch.to_digit(radix) else { break };
        value = value * f64::from(radix) + f64::from(digit);
        seen = true;
    }
    if seen {
        sign * value
    } else {
        f64::NAN
    }
}

pub(super) fn parse_float(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "parseFloat")?;
    let text = as_string(&value, heap, "parseFloat");
    value.drop_with_heap(heap);
    Ok(Value::Number(value::parse_number_literal(&text?)))
}

pub(super) fn is_nan(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "isNan")?;
    let n = as_number(&value, heap, "isNan");
    value.drop_with_heap(heap);
    Ok(Value::Bool(n?.is_nan()))
}

pub(super) fn is_infinite(heap: &mut Heap, args: Args) -> RunResult<Value> {
    let [value] = args.into_exact::<1>(heap, "isInfinite")?;
    let n = as_number(&value, heap, "isInfinite");
    value.drop_with_heap(heap);
    Ok(Value::Bool(n?.is_infinite()))
}

#[cfg(test)]
mod tests {
    use super::parse_int_text;

    #[test]
    fn parse_int_stops_at_garbage() {
        assert_eq!(parse_int_text("42abc", 10), 42.0);
        assert_eq!(parse_int_text("  -17 ", 10), -17.0);
        assert_eq!(parse_int_text("ff", 16), 255.0);
        assert_eq!(parse_int_text("0xff", 16), 255.0);
        assert_eq!(parse_int_text("z", 36), 35.0);
        assert!(parse_int_text("", 10).is_nan());
        assert!(parse_int_text("xyz", 10).is_nan());
    }
}

//! Native functions exposed to the language by name.
//!
//! Each concern has its own submodule; the [`BuiltinFunction`] enum is the
//! registry, with strum providing the name lookup (`FromStr`) and the
//! iteration behind [`Builtins::count`].

mod arrays;
mod containers;
mod convert;
pub(crate) mod json;
mod math;
mod print;
mod strings;

use std::str::FromStr;

use rand::rngs::StdRng;
use smallvec::SmallVec;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
    error::{ErrorKind, RunError, RunResult},
    heap::Heap,
    io::PrintWriter,
    value::Value,
};

/// Enumerates every native function in the standard registry.
///
/// Variant names serialize to camelCase (e.g. `JsonStringify` -> "jsonStringify"),
/// which is the name the language sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum BuiltinFunction {
    Print,
    Len,
    TypeOf,
    ToString,
    ToNumber,
    ToBoolean,
    ParseInt,
    ParseFloat,
    IsNan,
    IsInfinite,
    Upper,
    Lower,
    Trim,
    Split,
    Join,
    Contains,
    IndexOf,
    Substring,
    Replace,
    StartsWith,
    EndsWith,
    Repeat,
    Chars,
    Push,
    Pop,
    InsertAt,
    RemoveAt,
    Slice,
    Concat,
    Reverse,
    Sort,
    Range,
    Keys,
    Values,
    Delete,
    Abs,
    Floor,
    Ceil,
    Round,
    Sqrt,
    Pow,
    Min,
    Max,
    Random,
    Seed,
    JsonStringify,
    JsonParse,
    SetNew,
    SetAdd,
    SetHas,
    SetRemove,
    SetSize,
    PqNew,
    PqPush,
    PqPop,
    PqPeek,
    PqSize,
}

/// The immutable name -> native function registry consulted by the evaluator.
pub struct Builtins;

impl Builtins {
    /// Looks a builtin up by its language-visible name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<BuiltinFunction> {
        BuiltinFunction::from_str(name).ok()
    }

    /// Number of registered builtins.
    #[must_use]
    pub fn count() -> usize {
        BuiltinFunction::iter().count()
    }

    /// Iterates every registered builtin.
    pub fn iter() -> impl Iterator<Item = BuiltinFunction> {
        BuiltinFunction::iter()
    }
}

impl BuiltinFunction {
    /// The language-visible name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// One-line description shown by the REPL's `help`.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Print => "print values to the output, space separated",
            Self::Len => "length of a string, array, object, set, or priority queue",
            Self::TypeOf => "type name of a value",
            Self::ToString => "canonical string form of a value",
            Self::ToNumber => "convert a value to a number",
            Self::ToBoolean => "truthiness of a value",
            Self::ParseInt => "parse an integer, with an optional radix 2..36",
            Self::ParseFloat => "parse a decimal number",
            Self::IsNan => "whether a number is NaN",
            Self::IsInfinite => "whether a number is infinite",
            Self::Upper => "uppercase a string",
            Self::Lower => "lowercase a string",
            Self::Trim => "strip surrounding whitespace",
            Self::Split => "split a string on a separator",
            Self::Join => "join array elements into a string",
            Self::Contains => "whether a string or array contains a value",
            Self::IndexOf => "first position of a value in a string or array, or -1",
            Self::Substring => "byte-indexed substring",
            Self::Replace => "replace every occurrence of a substring",
            Self::StartsWith => "whether a string starts with a prefix",
            Self::EndsWith => "whether a string ends with a suffix",
            Self::Repeat => "repeat a string n times",
            Self::Chars => "array of a string's characters",
            Self::Push => "append to an array, returning the new length",
            Self::Pop => "remove and return the last array element",
            Self::InsertAt => "insert into an array at an index",
            Self::RemoveAt => "remove and return the array element at an index",
            Self::Slice => "copy a sub-range of an array",
            Self::Concat => "concatenate two arrays into a new one",
            Self::Reverse => "reverse an array in place",
            Self::Sort => "sort an array of numbers or strings in place",
            Self::Range => "array of numbers from start to end",
            Self::Keys => "array of an object's keys in insertion order",
            Self::Values => "array of an object's values in insertion order",
            Self::Delete => "remove a key from an object",
            Self::Abs => "absolute value",
            Self::Floor => "round down",
            Self::Ceil => "round up",
            Self::Round => "round to the nearest integer",
            Self::Sqrt => "square root",
            Self::Pow => "raise to a power",
            Self::Min => "smallest of the arguments",
            Self::Max => "largest of the arguments",
            Self::Random => "pseudo-random number in [0, 1)",
            Self::Seed => "seed the random number generator",
            Self::JsonStringify => "serialize a value to JSON",
            Self::JsonParse => "parse a JSON string",
            Self::SetNew => "create an empty set",
            Self::SetAdd => "add a value to a set",
            Self::SetHas => "whether a set contains a value",
            Self::SetRemove => "remove a value from a set",
            Self::SetSize => "number of values in a set",
            Self::PqNew => "create an empty priority queue",
            Self::PqPush => "insert a value with a priority",
            Self::PqPop => "remove and return the lowest-priority value",
            Self::PqPeek => "return the lowest-priority value without removing",
            Self::PqSize => "number of values in a priority queue",
        }
    }

    /// Calls this builtin with already-evaluated arguments.
    pub(crate) fn call<W: PrintWriter>(
        self,
        heap: &mut Heap,
        rng: &mut StdRng,
        print: &mut W,
        args: Args,
    ) -> RunResult<Value> {
        // Error values short-circuit through every builtin except the ones
        // that exist to inspect or render arbitrary values.
        if !matches!(self, Self::Print | Self::TypeOf | Self::ToString | Self::ToBoolean) {
            if let Some(err) = args_error(&args, heap) {
                args.drop_all(heap);
                return Err(err);
            }
        }

        match self {
            Self::Print => print::print(heap, args, print),
            Self::Len => convert::len(heap, args),
            Self::TypeOf => convert::type_of(heap, args),
            Self::ToString => convert::to_string(heap, args),
            Self::ToNumber => convert::to_number(heap, args),
            Self::ToBoolean => convert::to_boolean(heap, args),
            Self::ParseInt => convert::parse_int(heap, args),
            Self::ParseFloat => convert::parse_float(heap, args),
            Self::IsNan => convert::is_nan(heap, args),
            Self::IsInfinite => convert::is_infinite(heap, args),
            Self::Upper => strings::upper(heap, args),
            Self::Lower => strings::lower(heap, args),
            Self::Trim => strings::trim(heap, args),
            Self::Split => strings::split(heap, args),
            Self::Join => strings::join(heap, args),
            Self::Contains => strings::contains(heap, args),
            Self::IndexOf => strings::index_of(heap, args),
            Self::Substring => strings::substring(heap, args),
            Self::Replace => strings::replace(heap, args),
            Self::StartsWith => strings::starts_with(heap, args),
            Self::EndsWith => strings::ends_with(heap, args),
            Self::Repeat => strings::repeat(heap, args),
            Self::Chars => strings::chars(heap, args),
            Self::Push => arrays::push(heap, args),
            Self::Pop => arrays::pop(heap, args),
            Self::InsertAt => arrays::insert_at(heap, args),
            Self::RemoveAt => arrays::remove_at(heap, args),
            Self::Slice => arrays::slice(heap, args),
            Self::Concat => arrays::concat(heap, args),
            Self::Reverse => arrays::reverse(heap, args),
            Self::Sort => arrays::sort(heap, args),
            Self::Range => arrays::range(heap, args),
            Self::Keys => arrays::keys(heap, args),
            Self::Values => arrays::values(heap, args),
            Self::Delete => arrays::delete(heap, args),
            Self::Abs => math::abs(heap, args),
            Self::Floor => math::floor(heap, args),
            Self::Ceil => math::ceil(heap, args),
            Self::Round => math::round(heap, args),
            Self::Sqrt => math::sqrt(heap, args),
            Self::Pow => math::pow(heap, args),
            Self::Min => math::min(heap, args),
            Self::Max => math::max(heap, args),
            Self::Random => math::random(heap, rng, args),
            Self::Seed => math::seed(heap, rng, args),
            Self::JsonStringify => json::stringify(heap, args),
            Self::JsonParse => json::parse(heap, args),
            Self::SetNew => containers::set_new(heap, args),
            Self::SetAdd => containers::set_add(heap, args),
            Self::SetHas => containers::set_has(heap, args),
            Self::SetRemove => containers::set_remove(heap, args),
            Self::SetSize => containers::set_size(heap, args),
            Self::PqNew => containers::pq_new(heap, args),
            Self::PqPush => containers::pq_push(heap, args),
            Self::PqPop => containers::pq_pop(heap, args),
            Self::PqPeek => containers::pq_peek(heap, args),
            Self::PqSize => containers::pq_size(heap, args),
        }
    }
}

/// Returns the first error-valued argument as a propagating outcome.
fn args_error(args: &Args, heap: &Heap) -> Option<RunError> {
    args.values
        .iter()
        .find(|value| value.is_error(heap))
        .map(|value| RunError::Raised(value.clone_with_heap(heap)))
}

/// Evaluated call arguments, in source order.
pub(crate) struct Args {
    values: SmallVec<[Value; 4]>,
}

impl Args {
    pub fn new(values: SmallVec<[Value; 4]>) -> Self {
        Self { values }
    }

    pub fn drop_all(self, heap: &mut Heap) {
        for value in self.values {
            value.drop_with_heap(heap);
        }
    }

    /// Consumes the arguments, requiring exactly `N` of them.
    pub fn into_exact<const N: usize>(self, heap: &mut Heap, name: &str) -> RunResult<[Value; N]> {
        if self.values.len() != N {
            let got = self.values.len();
            self.drop_all(heap);
            return Err(ErrorKind::ArgumentMismatch.err(format!(
                "{name}() takes {N} argument{}, got {got}",
                if N == 1 { "" } else { "s" }
            )));
        }
        let mut values = self.values.into_iter();
        Ok(std::array::from_fn(|_| {
            values.next().expect("length checked above")
        }))
    }

    /// Consumes the arguments, requiring between `min` and `max` of them.
    pub fn into_between(
        self,
        heap: &mut Heap,
        name: &str,
        min: usize,
        max: usize,
    ) -> RunResult<SmallVec<[Value; 4]>> {
        if self.values.len() < min || self.values.len() > max {
            let got = self.values.len();
            self.drop_all(heap);
            return Err(ErrorKind::ArgumentMismatch.err(format!(
                "{name}() takes {min} to {max} arguments, got {got}"
            )));
        }
        Ok(self.values)
    }

    /// Consumes the arguments, requiring at least `min` of them.
    pub fn into_at_least(self, heap: &mut Heap, name: &str, min: usize) -> RunResult<SmallVec<[Value; 4]>> {
        if self.values.len() < min {
            let got = self.values.len();
            self.drop_all(heap);
            return Err(ErrorKind::ArgumentMismatch.err(format!(
                "{name}() takes at least {min} argument{}, got {got}",
                if min == 1 { "" } else { "s" }
            )));
        }
        Ok(self.values)
    }
}

// Borrow-based argument extraction. Builtins extract every argument by
// reference first, release the argument values, and only then allocate or
// mutate; this keeps every error path leak-free.

/// Reads a number argument without consuming the value.
pub(crate) fn as_number(value: &Value, heap: &Heap, name: &str) -> RunResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(ErrorKind::ArgumentMismatch.err(format!(
            "{name}() expected a number, got {}",
            other.type_name(heap)
        ))),
    }
}

/// Reads an integral number argument without consuming the value.
pub(crate) fn as_int(value: &Value, heap: &Heap, name: &str) -> RunResult<i64> {
    let n = as_number(value, heap, name)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(ErrorKind::ArgumentMismatch.err(format!("{name}() expected an integer, got {n}")));
    }
    Ok(n as i64)
}

/// Clones a string argument's content without consuming the value.
pub(crate) fn as_string(value: &Value, heap: &Heap, name: &str) -> RunResult<String> {
    match value.as_str(heap) {
        Some(s) => Ok(s.to_owned()),
        None => Err(ErrorKind::ArgumentMismatch.err(format!(
            "{name}() expected a string, got {}",
            value.type_name(heap)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_uses_camel_case() {
        assert_eq!(Builtins::lookup("print"), Some(BuiltinFunction::Print));
        assert_eq!(Builtins::lookup("jsonStringify"), Some(BuiltinFunction::JsonStringify));
        assert_eq!(Builtins::lookup("typeOf"), Some(BuiltinFunction::TypeOf));
        assert_eq!(Builtins::lookup("pqPush"), Some(BuiltinFunction::PqPush));
        assert_eq!(Builtins::lookup("nope"), None);
    }

    #[test]
    fn count_covers_all_variants() {
        assert_eq!(Builtins::count(), BuiltinFunction::iter().count());
        assert!(Builtins::count() >= 50);
    }

    #[test]
    fn every_builtin_has_a_description() {
        for builtin in Builtins::iter() {
            assert!(!builtin.description().is_empty(), "{builtin} lacks a description");
        }
    }
}

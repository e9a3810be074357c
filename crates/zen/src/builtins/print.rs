//! Implementation of the print() builtin function.

use super::Args;
use crate::{error::RunResult, heap::Heap, io::PrintWriter, value::Value};

/// Renders each argument in canonical form, space separated, and always ends
/// the line with a newline.
pub(super) fn print<W: PrintWriter>(heap: &mut Heap, args: Args, out: &mut W) -> RunResult<Value> {
    let mut output = String::new();
    let mut first = true;
    for value in args.values {
        if first {
            first = false;
        } else {
            output.push(' ');
        }
        output.push_str(&value.display_string(heap));
        value.drop_with_heap(heap);
    }
    output.push('\n');
    out.write(&output);
    Ok(Value::Null)
}

//! Mapping from byte offsets to 1-based line/column positions.

use crate::ast::Loc;

/// Precomputed table of line start offsets for a source buffer.
pub(crate) struct LineMap {
    line_starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self { line_starts }
    }

    /// Converts a byte offset to its 1-based line and column.
    pub fn location(&self, offset: usize) -> Loc {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        Loc {
            line: u32::try_from(line + 1).unwrap_or(u32::MAX),
            column: u32::try_from(offset - self.line_starts[line] + 1).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let map = LineMap::new("abc");
        assert_eq!(map.location(0).to_string(), "1:1");
        assert_eq!(map.location(2).to_string(), "1:3");
    }

    #[test]
    fn line_breaks() {
        let map = LineMap::new("ab\ncd\n\nef");
        assert_eq!(map.location(3).to_string(), "2:1");
        assert_eq!(map.location(4).to_string(), "2:2");
        assert_eq!(map.location(6).to_string(), "3:1");
        assert_eq!(map.location(7).to_string(), "4:1");
    }
}

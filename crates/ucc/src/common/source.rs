//! Line/column tracking for source offsets

use std::fmt;

/// A resolved source position. Lines and columns are 1-based; columns count bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Byte offsets of every line start, for offset -> (line, column) lookups
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    pub fn position(&self, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position {
            line: line as u32 + 1,
            column: (offset - self.line_starts[line]) as u32 + 1,
            offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_across_lines() {
        let index = LineIndex::new("int x;\r\n  x = 1;\n");
        assert_eq!(index.position(0), Position { line: 1, column: 1, offset: 0 });
        assert_eq!(index.position(4).column, 5);
        let p = index.position(10);
        assert_eq!((p.line, p.column), (2, 3));
        assert_eq!(p.to_string(), "2:3");
    }

    #[test]
    fn test_offset_at_end_of_input() {
        let index = LineIndex::new("a\nb");
        let p = index.position(3);
        assert_eq!((p.line, p.column), (2, 2));
    }
}

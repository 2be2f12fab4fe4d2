use crate::core::error::ParseError;
use memchr::memchr2;

/// Splits `text` into fields on tab and newline.
///
/// Every other byte is field content. A trailing newline does not open a new
/// field, so `"A\tB\n1\t2\n"` yields `["A", "B", "1", "2"]`.
pub fn tokenize(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut fields = Vec::with_capacity(bytes.len() / 8 + 1);
    let mut start = 0usize;
    while let Some(off) = memchr2(b'\t', b'\n', &bytes[start..]) {
        let end = start + off;
        fields.push(&text[start..end]);
        start = end + 1;
    }
    if start < bytes.len() {
        fields.push(&text[start..]);
    }
    fields
}

/// Number of fields on the first line.
pub fn header_width(text: &str) -> usize {
    let line = match memchr::memchr(b'\n', text.as_bytes()) {
        Some(end) => &text[..end],
        None => text,
    };
    if line.is_empty() {
        return 0;
    }
    memchr::memchr_iter(b'\t', line.as_bytes()).count() + 1
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    pub header: usize,
    pub stride: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    /// 1-based, header excluded.
    pub number: usize,
    pub cells: &'a [&'a str],
}

impl Layout {
    pub const fn new(header: usize, stride: usize) -> Self {
        Self { header, stride }
    }

    /// Header and stride both equal to the width of the first line.
    pub fn from_header(text: &str) -> Self {
        let w = header_width(text);
        Self::new(w, w)
    }

    pub fn rows<'a>(&self, fields: &'a [&'a str]) -> Rows<'a> {
        let body = fields.get(self.header..).unwrap_or(&[]);
        Rows {
            body,
            stride: self.stride.max(1),
            pos: 0,
            number: 0,
        }
    }
}

pub struct Rows<'a> {
    body: &'a [&'a str],
    stride: usize,
    pos: usize,
    number: usize,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Result<Row<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.body.len() {
            return None;
        }
        let end = self.pos + self.stride;
        self.number += 1;
        if end > self.body.len() {
            let tail = &self.body[self.pos..];
            self.pos = self.body.len();
            if tail.iter().all(|f| f.is_empty()) {
                return None;
            }
            return Some(Err(ParseError::ShortRow {
                row: self.number,
                expected: self.stride,
                found: tail.len(),
            }));
        }
        let cells = &self.body[self.pos..end];
        self.pos = end;
        Some(Ok(Row {
            number: self.number,
            cells,
        }))
    }
}

impl Row<'_> {
    pub fn number_at(&self, column: usize) -> Result<f64, ParseError> {
        let raw = self.cells.get(column).copied().unwrap_or("");
        parse_number(raw).ok_or_else(|| ParseError::InvalidNumber {
            row: self.number,
            column: column + 1,
            value: raw.to_string(),
        })
    }
}

/// Finite floating-point value of a cell; `nan` and `inf` are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn tokenizes_tabs_and_newlines() {
        assert_eq!(tokenize("A\tB\n1\t2\n"), vec!["A", "B", "1", "2"]);
    }

    #[test_case("a,b\t1" => vec!["a,b", "1"]; "unterminated tail kept")]
    #[test_case("a\t\tb\n" => vec!["a", "", "b"]; "empty middle field")]
    #[test_case("a\n\n" => vec!["a", ""]; "blank line")]
    #[test_case("" => Vec::<&str>::new(); "empty input")]
    #[test_case("x\r\ny\n" => vec!["x\r", "y"]; "carriage return is content")]
    fn tokenize_edges(input: &str) -> Vec<&str> {
        tokenize(input)
    }

    #[test_case("a\tb\tc\n1\t2\t3\n" => 3)]
    #[test_case("only" => 1)]
    #[test_case("\nrest" => 0)]
    fn header_width_counts_first_line(input: &str) -> usize {
        header_width(input)
    }

    #[test]
    fn rows_skip_header_and_walk_by_stride() {
        let fields = tokenize("h1\th2\nx\t1\ny\t2\n");
        let rows: Vec<_> = Layout::new(2, 2)
            .rows(&fields)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].number, 2);
        assert_eq!(rows[1].cells, &["y", "2"]);
    }

    #[test]
    fn trailing_empty_fields_are_ignored() {
        let fields = tokenize("h1\th2\nx\t1\n\n");
        let rows: Vec<_> = Layout::new(2, 2).rows(&fields).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_ok());
    }

    #[test]
    fn short_row_is_reported() {
        let fields = tokenize("h1\th2\th3\nx\t1\t2\ny\t3\n");
        let err = Layout::new(3, 3)
            .rows(&fields)
            .find_map(|r| r.err())
            .unwrap();
        assert_eq!(
            err,
            ParseError::ShortRow {
                row: 2,
                expected: 3,
                found: 2
            }
        );
    }

    #[test_case("12.5" => Some(12.5))]
    #[test_case(" 3 " => Some(3.0); "surrounding spaces")]
    #[test_case("nan" => None)]
    #[test_case("inf" => None)]
    #[test_case("NA" => None)]
    fn numbers(raw: &str) -> Option<f64> {
        parse_number(raw)
    }

    #[test]
    fn invalid_number_names_the_cell() {
        let fields = tokenize("h1\th2\nx\tabc\n");
        let row = Layout::new(2, 2).rows(&fields).next().unwrap().unwrap();
        let err = row.number_at(1).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidNumber {
                row: 1,
                column: 2,
                value: "abc".to_string()
            }
        );
    }
}

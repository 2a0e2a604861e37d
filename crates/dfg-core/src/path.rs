//! Path expressions addressing a node inside a YAML document.
//!
//! A path is a concatenation of `.key` and `[n]` segments, for example
//! `.dev.servers[0].dockerfileConfig`. Keys that contain `.` or `[` can be
//! written as `["some.key"]`. The empty path and `.` both address the root.

use std::fmt;

use serde_yaml::Value;
use tracing::trace;

use crate::error::{Error, Span};
use crate::value::{kind, render_scalar};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) if key.contains(['.', '[', ']']) => write!(f, "[{key:?}]"),
            Self::Key(key) => write!(f, ".{key}"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl Path {
    pub fn parse(input: &str) -> Result<Self, Error> {
        let mut parser = Parser::new(input);
        let segments = parser.parse_path()?;
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Walks `root` segment by segment and returns the addressed node.
    pub fn resolve<'a>(&self, root: &'a Value) -> Result<&'a Value, Error> {
        let mut current = root;
        let mut walked = String::new();

        for segment in &self.segments {
            walked.push_str(&segment.to_string());
            trace!(path = %walked, node = kind(current), "resolving path segment");

            current = match segment {
                Segment::Key(key) => {
                    let Value::Mapping(mapping) = current else {
                        return Err(Error::path_not_found(
                            walked,
                            format!("{segment} (found {})", kind(current)),
                        ));
                    };
                    mapping
                        .iter()
                        .find(|(candidate, _)| render_scalar(candidate).as_deref() == Some(key))
                        .map(|(_, value)| value)
                        .ok_or_else(|| Error::path_not_found(walked.clone(), segment.to_string()))?
                }
                Segment::Index(index) => {
                    let Value::Sequence(items) = current else {
                        return Err(Error::invalid_path(
                            format!(
                                "{walked}: index requires a sequence, found {}",
                                kind(current)
                            ),
                            None,
                        ));
                    };
                    items
                        .get(*index)
                        .ok_or_else(|| Error::index_out_of_range(walked.clone(), *index, items.len()))?
                }
            };
        }

        Ok(current)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(".");
        }
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

pub fn parse_path(input: &str) -> Result<Path, Error> {
    Path::parse(input)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_path(&mut self) -> Result<Vec<Segment>, Error> {
        if self.input.trim().is_empty() || self.input.trim() == "." {
            return Ok(Vec::new());
        }

        let mut segments = Vec::new();
        while let Some(byte) = self.peek_byte() {
            match byte {
                b'.' => {
                    self.bump_byte();
                    segments.push(Segment::Key(self.parse_key()?));
                }
                b'[' => {
                    self.bump_byte();
                    segments.push(self.parse_bracket()?);
                }
                _ => return Err(self.error("expected '.' or '['")),
            }
        }

        Ok(segments)
    }

    fn parse_key(&mut self) -> Result<String, Error> {
        let start = self.pos;
        while let Some(byte) = self.peek_byte() {
            if byte == b'.' || byte == b'[' || byte == b']' {
                break;
            }
            self.bump_byte();
        }

        if start == self.pos {
            return Err(self.error("expected key after '.'"));
        }

        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_bracket(&mut self) -> Result<Segment, Error> {
        self.skip_ws();
        let segment = match self.peek_byte() {
            Some(b'"') | Some(b'\'') => Segment::Key(self.parse_string()?),
            Some(byte) if byte.is_ascii_digit() => Segment::Index(self.parse_usize()?),
            _ => return Err(self.error("expected non-negative index or quoted key")),
        };
        self.skip_ws();
        self.expect_byte(b']')?;
        Ok(segment)
    }

    fn parse_usize(&mut self) -> Result<usize, Error> {
        let start = self.pos;
        while let Some(byte) = self.peek_byte() {
            if byte.is_ascii_digit() {
                self.bump_byte();
            } else {
                break;
            }
        }

        self.input[start..self.pos]
            .parse::<usize>()
            .map_err(|_| self.error("invalid numeric index"))
    }

    fn parse_string(&mut self) -> Result<String, Error> {
        let Some(quote) = self.peek_byte() else {
            return Err(self.error("expected string"));
        };
        self.bump_byte();

        let mut out = String::new();
        loop {
            let Some(ch) = self.peek_char() else {
                return Err(self.error("unterminated string"));
            };
            self.pos += ch.len_utf8();

            if ch as u32 == u32::from(quote) {
                return Ok(out);
            }

            if ch == '\\' {
                let Some(escaped) = self.peek_char() else {
                    return Err(self.error("unterminated escape sequence"));
                };
                self.pos += escaped.len_utf8();
                match escaped {
                    '"' | '\'' | '\\' => out.push(escaped),
                    _ => return Err(self.error("unsupported string escape")),
                }
                continue;
            }

            out.push(ch);
        }
    }

    fn skip_ws(&mut self) {
        while let Some(byte) = self.peek_byte() {
            if byte.is_ascii_whitespace() {
                self.bump_byte();
            } else {
                break;
            }
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<(), Error> {
        match self.peek_byte() {
            Some(byte) if byte == expected => {
                self.bump_byte();
                Ok(())
            }
            _ => Err(self.error(format!("expected '{}'", expected as char))),
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump_byte(&mut self) {
        self.pos += 1;
    }

    fn error(&self, msg: impl Into<String>) -> Error {
        let span = Some(Span::new(self.pos, self.pos.saturating_add(1)));
        Error::invalid_path(msg, span)
    }
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;

    use crate::error::Error;
    use crate::path::{Segment, parse_path};

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).expect("yaml should parse")
    }

    #[test]
    fn parses_keys_and_indices() {
        let path = parse_path(".dev.servers[0].dockerfileConfig").expect("path should parse");
        assert_eq!(
            path.segments,
            vec![
                Segment::Key("dev".to_string()),
                Segment::Key("servers".to_string()),
                Segment::Index(0),
                Segment::Key("dockerfileConfig".to_string()),
            ]
        );
        assert_eq!(path.to_string(), ".dev.servers[0].dockerfileConfig");
    }

    #[test]
    fn parses_quoted_bracket_keys() {
        let path = parse_path(r#"["app.v1"][2]"#).expect("path should parse");
        assert_eq!(
            path.segments,
            vec![Segment::Key("app.v1".to_string()), Segment::Index(2)]
        );
    }

    #[test]
    fn empty_and_dot_address_the_root() {
        assert!(parse_path("").expect("path should parse").is_root());
        assert!(parse_path(".").expect("path should parse").is_root());
    }

    #[test]
    fn rejects_malformed_paths() {
        for input in ["dev", ".dev.", "..dev", ".a[", ".a[x]", ".a[-1]", ".a[0"] {
            let error = parse_path(input).expect_err("path should fail");
            assert!(
                matches!(error, Error::InvalidPath { .. }),
                "{input} gave {error}"
            );
        }
    }

    #[test]
    fn resolves_nested_node() {
        let document = yaml(
            "a:\n  b:\n    - c:\n        stages:\n          final:\n            - workdir: {dir: /app}\n",
        );
        let node = parse_path(".a.b[0].c")
            .expect("path should parse")
            .resolve(&document)
            .expect("path should resolve");
        assert!(node.get("stages").is_some());
    }

    #[test]
    fn resolves_numeric_mapping_keys() {
        let document = yaml("envs:\n  1: {name: one}\n");
        let node = parse_path(".envs.1.name")
            .expect("path should parse")
            .resolve(&document)
            .expect("path should resolve");
        assert_eq!(node.as_str(), Some("one"));
    }

    #[test]
    fn reports_missing_key() {
        let document = yaml("a: {b: 1}");
        let error = parse_path(".a.c")
            .expect("path should parse")
            .resolve(&document)
            .expect_err("path should fail");
        assert!(matches!(error, Error::PathNotFound { ref path, .. } if path == ".a.c"));
    }

    #[test]
    fn reports_key_on_non_mapping() {
        let document = yaml("a: [1, 2]");
        let error = parse_path(".a.b")
            .expect("path should parse")
            .resolve(&document)
            .expect_err("path should fail");
        assert!(matches!(error, Error::PathNotFound { .. }));
    }

    #[test]
    fn reports_index_errors() {
        let document = yaml("a: [1, 2]\nb: {c: 1}");
        let error = parse_path(".a[2]")
            .expect("path should parse")
            .resolve(&document)
            .expect_err("index should be out of range");
        assert!(matches!(
            error,
            Error::IndexOutOfRange {
                index: 2,
                len: 2,
                ..
            }
        ));

        let error = parse_path(".b[0]")
            .expect("path should parse")
            .resolve(&document)
            .expect_err("index on mapping should fail");
        assert!(matches!(error, Error::InvalidPath { .. }));
    }
}

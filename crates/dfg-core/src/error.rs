use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("path not found: {path} (no match for {segment})")]
    PathNotFound { path: String, segment: String },

    #[error("invalid path{}: {msg}", span.map(|span| format!(" at {span}")).unwrap_or_default())]
    InvalidPath { msg: String, span: Option<Span> },

    #[error("index out of range: {path} (index {index}, length {len})")]
    IndexOutOfRange {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("unknown instruction kind \"{kind}\" in stage \"{stage}\" at position {index}")]
    UnknownInstructionKind {
        stage: String,
        index: usize,
        kind: String,
    },

    #[error("malformed {kind} instruction in stage \"{stage}\" at position {index}: {msg}")]
    MalformedInstructionShape {
        stage: String,
        index: usize,
        kind: String,
        msg: String,
    },

    #[error("malformed stages structure: {msg}")]
    MalformedStagesStructure { msg: String },

    #[error("failed to read document {}: {source}", path.display())]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse document: {source}")]
    DocumentParse {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("io error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("verification failed: {msg}")]
    Verify { msg: String },
}

impl Error {
    pub fn path_not_found(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::PathNotFound {
            path: path.into(),
            segment: segment.into(),
        }
    }

    pub fn invalid_path(msg: impl Into<String>, span: Option<Span>) -> Self {
        Self::InvalidPath {
            msg: msg.into(),
            span,
        }
    }

    pub fn index_out_of_range(path: impl Into<String>, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange {
            path: path.into(),
            index,
            len,
        }
    }

    pub fn unknown_instruction(
        stage: impl Into<String>,
        index: usize,
        kind: impl Into<String>,
    ) -> Self {
        Self::UnknownInstructionKind {
            stage: stage.into(),
            index,
            kind: kind.into(),
        }
    }

    pub fn malformed_instruction(
        stage: impl Into<String>,
        index: usize,
        kind: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::MalformedInstructionShape {
            stage: stage.into(),
            index,
            kind: kind.into(),
            msg: msg.into(),
        }
    }

    pub fn malformed_stages(msg: impl Into<String>) -> Self {
        Self::MalformedStagesStructure { msg: msg.into() }
    }

    pub fn document_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DocumentRead {
            path: path.into(),
            source,
        }
    }

    pub fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }

    pub fn verify(msg: impl Into<String>) -> Self {
        Self::Verify { msg: msg.into() }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::io(value)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::DocumentParse { source }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, Span};

    #[test]
    fn invalid_path_includes_span_when_present() {
        let error = Error::invalid_path("expected key", Some(Span::new(3, 4)));
        assert_eq!(error.to_string(), "invalid path at 3..4: expected key");

        let error = Error::invalid_path("path must start with '.' or '['", None);
        assert_eq!(
            error.to_string(),
            "invalid path: path must start with '.' or '['"
        );
    }

    #[test]
    fn malformed_instruction_names_stage_and_position() {
        let error = Error::malformed_instruction("builder", 2, "run", "expected sequence");
        assert_eq!(
            error.to_string(),
            "malformed run instruction in stage \"builder\" at position 2: expected sequence"
        );
    }
}

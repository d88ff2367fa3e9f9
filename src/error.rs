//! Structured syntax errors for the VM parser.
use thiserror::Error;

/// A line that failed to classify as a VM command, with enough context to
/// reproduce the diagnostic required by the error-handling design: file name,
/// 1-based line number, and the offending text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{file}:{line}: {kind} (`{text}`)")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub file: String,
    /// 1-based source line number.
    pub line: usize,
    pub text: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, file: impl Into<String>, line: usize, text: &str) -> Self {
        ParseError {
            kind,
            file: file.into(),
            line,
            text: text.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unknown VM instruction `{0}`")]
    UnknownInstruction(String),
    #[error("unknown segment `{0}`")]
    UnknownSegment(String),
    #[error("expected {0}, found nothing")]
    MissingOperand(&'static str),
    #[error("invalid index `{0}`")]
    InvalidIndex(String),
    #[error("invalid symbol `{0}`")]
    InvalidSymbol(String),
    #[error("`pop constant` has no destination address")]
    PopIntoConstant,
    #[error("`pointer {0}` is out of range, expected 0 or 1")]
    PointerOutOfRange(u16),
    #[error("`temp {0}` is out of range, expected 0..=7")]
    TempOutOfRange(u16),
}

use thiserror::Error;

type Span = logos::Span;

/// Schematic parse errors
///
/// Any of these aborts parsing; no partial tree is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected end of input at {at:?}")]
    UnexpectedEof { at: Span },
    #[error("Unexpected token {found} at {at:?}")]
    UnexpectedToken { found: String, at: Span },
    #[error("Unterminated string starting at {at:?}")]
    UnterminatedString { at: Span },
    #[error("Trailing input after root expression at {at:?}")]
    TrailingInput { at: Span },
}

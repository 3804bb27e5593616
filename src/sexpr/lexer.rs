use logos::{Logos, SpannedIter};

pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) span: logos::Span,
}

pub(super) struct TokenIter<'a> {
    iter: SpannedIter<'a, LogosTokenKind>,
}

impl<'a> TokenIter<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            iter: LogosTokenKind::lexer(input).spanned(),
        }
    }
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next() {
            Some((Ok(kind), span)) => {
                let (kind, span) = match kind {
                    LogosTokenKind::LParen => (TokenKind::LParen, span),
                    LogosTokenKind::RParen => (TokenKind::RParen, span),
                    LogosTokenKind::QuotedString => {
                        (TokenKind::Quoted, (span.start + 1)..(span.end - 1))
                    }
                    LogosTokenKind::Bare => (TokenKind::Bare, span),
                    LogosTokenKind::WS => unreachable!(),
                };
                Some(Token { kind, span })
            }
            Some((Err(_), span)) => Some(Token {
                kind: TokenKind::Error,
                span,
            }),
            None => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TokenKind {
    LParen,
    RParen,
    /// Span excludes the surrounding quotes; escapes are still in place
    Quoted,
    Bare,
    Error,
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r#""([^"\\]|\\.|\\\n)*""#)]
    QuotedString,
    #[regex(r#"[^"() \t\r\n][^() \t\r\n]*"#)]
    Bare,
    #[regex(r"[ \t\r\n]+", logos::skip)]
    WS,
}

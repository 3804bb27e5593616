use std::{borrow::Cow, iter::Peekable};

use crate::error::ParseError;

use super::{
    lexer::{Token, TokenIter, TokenKind},
    Atom, SExpr,
};

pub(super) struct Parser<'a> {
    input: &'a str,
    iter: Peekable<TokenIter<'a>>,
}

type Span = logos::Span;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParsedSExpr {
    List(Vec<ParsedSExpr>),
    Quoted(Span),
    Bare(Span),
}

impl ParsedSExpr {
    fn into_sexpr(self, input: &str) -> SExpr {
        match self {
            ParsedSExpr::List(children) => {
                let children: Box<[SExpr]> =
                    children.into_iter().map(|c| c.into_sexpr(input)).collect();
                SExpr::List(children)
            }
            ParsedSExpr::Quoted(span) => SExpr::Atom(Atom::String(unescape(&input[span]))),
            ParsedSExpr::Bare(span) => SExpr::Atom(Atom::from_bare(&input[span])),
        }
    }
}

/// A backslash yields the following character literally.
fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('\\') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

impl<'a> Parser<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            input,
            iter: TokenIter::new(input).peekable(),
        }
    }

    fn eof(&self) -> ParseError {
        let end = self.input.len();
        ParseError::UnexpectedEof { at: end..end }
    }

    fn get(&mut self) -> Result<Token, ParseError> {
        self.iter.next().ok_or_else(|| self.eof())
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.iter.peek().map(|tok| tok.kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let tok = self.get()?;
        if tok.kind == kind {
            Ok(tok)
        } else {
            Err(self.unexpected(tok))
        }
    }

    fn unexpected(&self, tok: Token) -> ParseError {
        match tok.kind {
            TokenKind::Error if self.input[tok.span.clone()].starts_with('"') => {
                ParseError::UnterminatedString { at: tok.span }
            }
            kind => ParseError::UnexpectedToken {
                found: format!("{:?}", kind),
                at: tok.span,
            },
        }
    }

    fn parse_node(&mut self) -> Result<ParsedSExpr, ParseError> {
        match self.peek() {
            Some(TokenKind::LParen) => self.parse_list(),
            Some(TokenKind::Quoted) => Ok(ParsedSExpr::Quoted(self.get()?.span)),
            Some(TokenKind::Bare) => Ok(ParsedSExpr::Bare(self.get()?.span)),
            Some(TokenKind::RParen) | Some(TokenKind::Error) => {
                let tok = self.get()?;
                Err(self.unexpected(tok))
            }
            None => Err(self.eof()),
        }
    }

    fn parse_list(&mut self) -> Result<ParsedSExpr, ParseError> {
        self.expect(TokenKind::LParen)?;

        let mut children = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::RParen) => {
                    self.iter.next();
                    break Ok(ParsedSExpr::List(children));
                }
                Some(_) => children.push(self.parse_node()?),
                None => break Err(self.eof()),
            }
        }
    }

    fn parse_root(&mut self) -> Result<ParsedSExpr, ParseError> {
        let root = self.parse_node()?;
        match self.iter.next() {
            None => Ok(root),
            Some(tok) if tok.kind == TokenKind::Error => Err(self.unexpected(tok)),
            Some(tok) => Err(ParseError::TrailingInput { at: tok.span }),
        }
    }
}

/// Parse a single root expression
pub fn parse(input: &str) -> Result<SExpr<'_>, ParseError> {
    let mut parser = Parser::new(input);
    let sexpr = parser.parse_root()?;
    Ok(sexpr.into_sexpr(input))
}

impl<'a> TryFrom<&'a str> for SExpr<'a> {
    type Error = ParseError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        parse(input)
    }
}

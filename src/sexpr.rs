use std::{borrow::Cow, fmt::Display};

mod lexer;
mod parser;

pub use parser::parse;

/// A leaf value. Bare tokens that read as a finite decimal number become
/// [`Atom::Number`]; everything else, including every quoted string, is
/// an [`Atom::String`].
#[derive(Debug, PartialEq, Clone)]
pub enum Atom<'a> {
    Number(f64),
    String(Cow<'a, str>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum SExpr<'a> {
    List(Box<[SExpr<'a>]>),
    Atom(Atom<'a>),
}

impl<'a> Atom<'a> {
    pub(crate) fn from_bare(token: &'a str) -> Self {
        match token.parse::<f64>() {
            Ok(n) if n.is_finite() => Atom::Number(n),
            _ => Atom::String(Cow::Borrowed(token)),
        }
    }

    /// The atom rendered as text. Numbers print without a trailing `.0`.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Atom::String(s) => Cow::Borrowed(s.as_ref()),
            Atom::Number(n) if *n == 0.0 => Cow::Borrowed("0"),
            Atom::Number(n) => Cow::Owned(n.to_string()),
        }
    }

    /// Numeric view of the atom; numeric strings are coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Atom::Number(n) => Some(*n),
            Atom::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Atom::String(s) => Some(s),
            Atom::Number(_) => None,
        }
    }
}

impl<'a> Display for Atom<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Atom::Number(_) => write!(f, "{}", self.text()),
            Atom::String(s) if needs_quotes(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        write!(f, "\\")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, "\"")
            }
            Atom::String(s) => write!(f, "{s}"),
        }
    }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.starts_with('"')
        || s.contains(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n' | '(' | ')' | '\\'))
        || matches!(Atom::from_bare(s), Atom::Number(_))
}

impl<'a> Display for SExpr<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::List(children) => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            SExpr::Atom(atom) => write!(f, "{}", atom),
        }
    }
}

impl<'a> SExpr<'a> {
    pub fn as_list(&self) -> Option<&[SExpr<'a>]> {
        match self {
            SExpr::List(children) => Some(children),
            SExpr::Atom(_) => None,
        }
    }

    pub fn as_atom(&self) -> Option<&Atom<'a>> {
        match self {
            SExpr::Atom(atom) => Some(atom),
            SExpr::List(_) => None,
        }
    }

    /// Atom at `index` of a list
    pub fn atom(&self, index: usize) -> Option<&Atom<'a>> {
        self.as_list()?.get(index)?.as_atom()
    }

    /// The leading atom of a list
    pub fn tag(&self) -> Option<&Atom<'a>> {
        self.atom(0)
    }

    /// True if this is a list led by the string atom `label`
    pub fn is(&self, label: &str) -> bool {
        self.tag().and_then(Atom::as_str) == Some(label)
    }

    pub fn children<'b, 'c>(&'b self, label: &'c str) -> LabeledChildIterator<'a, 'b, 'c> {
        let iter = self.as_list().map(|children| children.iter());
        LabeledChildIterator { iter, label }
    }

    pub fn child(&self, label: &str) -> Option<&SExpr<'a>> {
        self.children(label).next()
    }

    /// Second atom of the first `(label value ...)` child that has one
    pub fn value(&self, label: &str) -> Option<&Atom<'a>> {
        self.children(label).find_map(|child| child.atom(1))
    }

    /// Third atom of the first `(property "name" value ...)` child
    pub fn property(&self, name: &str) -> Option<&Atom<'a>> {
        self.children("property")
            .filter(|child| child.atom(1).and_then(Atom::as_str) == Some(name))
            .find_map(|child| child.atom(2))
    }

    /// Coordinates of the first `(at x y ...)` child. Anything after `y`,
    /// such as a rotation, is ignored.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.children("at").find_map(|child| {
            let x = child.atom(1)?.as_f64()?;
            let y = child.atom(2)?.as_f64()?;
            Some((x, y))
        })
    }
}

#[derive(Debug)]
pub struct LabeledChildIterator<'a, 'b, 'c> {
    iter: Option<std::slice::Iter<'b, SExpr<'a>>>,
    label: &'c str,
}

impl<'a, 'b, 'c> Iterator for LabeledChildIterator<'a, 'b, 'c> {
    type Item = &'b SExpr<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let label = self.label;
        let iter = self.iter.as_mut()?;
        iter.find(|item| item.is(label))
    }
}

impl<'a> TryFrom<&'a String> for SExpr<'a> {
    type Error = crate::error::ParseError;

    fn try_from(input: &'a String) -> Result<Self, Self::Error> {
        SExpr::try_from(input.as_str())
    }
}

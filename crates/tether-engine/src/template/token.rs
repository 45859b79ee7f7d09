//! Token definitions for template text.

use std::fmt;

/// A token in template text.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `template`
    Template,
    /// `@since`
    Since,
    /// `@version`
    VersionAnnotation,

    /// Identifier or dotted qualified name
    Ident(String),
    /// Release tag literal (`1.12.2`, `1.13-pre7`)
    Version(String),

    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `->`
    Arrow,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Template => write!(f, "template"),
            Token::Since => write!(f, "@since"),
            Token::VersionAnnotation => write!(f, "@version"),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Version(v) => write!(f, "{}", v),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Less => write!(f, "<"),
            Token::Greater => write!(f, ">"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Arrow => write!(f, "->"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Source location information for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

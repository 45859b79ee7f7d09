//! Lexer for template text.
//!
//! Built on logos. Whitespace, line comments and block comments are skipped;
//! every token carries its line and column for error reporting.

use logos::Logos;

use super::error::{SyntaxErrorKind, TemplateSyntaxError};
use super::token::{Span, Token};

#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*", lex_block_comment)]
    BlockComment,

    #[token("template")]
    Template,

    #[token("@since")]
    Since,

    #[token("@version")]
    VersionAnnotation,

    // Qualified names are a single token
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+(\.[0-9]+)*(-[A-Za-z0-9]+)?", |lex| lex.slice().to_string())]
    Version(String),

    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("->")]
    Arrow,
}

fn lex_block_comment(lex: &mut logos::Lexer<LogosToken>) -> logos::Skip {
    // "/*" is consumed; find "*/"
    let remainder = lex.remainder();
    match remainder.find("*/") {
        Some(end) => lex.bump(end + 2),
        // Unterminated comment runs to the end of input
        None => lex.bump(remainder.len()),
    }
    logos::Skip
}

impl LogosToken {
    fn into_token(self) -> Token {
        match self {
            LogosToken::Template => Token::Template,
            LogosToken::Since => Token::Since,
            LogosToken::VersionAnnotation => Token::VersionAnnotation,
            LogosToken::Ident(name) => Token::Ident(name),
            LogosToken::Version(v) => Token::Version(v),
            LogosToken::LeftBrace => Token::LeftBrace,
            LogosToken::RightBrace => Token::RightBrace,
            LogosToken::LeftParen => Token::LeftParen,
            LogosToken::RightParen => Token::RightParen,
            LogosToken::LeftBracket => Token::LeftBracket,
            LogosToken::RightBracket => Token::RightBracket,
            LogosToken::Less => Token::Less,
            LogosToken::Greater => Token::Greater,
            LogosToken::Comma => Token::Comma,
            LogosToken::Semicolon => Token::Semicolon,
            LogosToken::Arrow => Token::Arrow,
            // Skipped by logos
            LogosToken::Whitespace | LogosToken::LineComment | LogosToken::BlockComment => Token::Eof,
        }
    }
}

/// Template lexer
pub struct Lexer<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, line_starts }
    }

    fn position(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = self.source[self.line_starts[line]..offset].chars().count() + 1;
        (line as u32 + 1, column as u32)
    }

    /// Tokenize the whole input. The last token is always [`Token::Eof`].
    pub fn tokenize(self) -> Result<Vec<(Token, Span)>, TemplateSyntaxError> {
        let mut tokens = Vec::new();
        let mut lex = LogosToken::lexer(self.source);

        while let Some(result) = lex.next() {
            let range = lex.span();
            let (line, column) = self.position(range.start);
            match result {
                Ok(token) => tokens.push((token.into_token(), Span::new(range.start, range.end, line, column))),
                Err(()) => {
                    let ch = self.source[range.start..].chars().next().unwrap_or('\0');
                    return Err(TemplateSyntaxError::new(
                        SyntaxErrorKind::UnexpectedCharacter(ch),
                        line,
                        column,
                    ));
                }
            }
        }

        let end = self.source.len();
        let (line, column) = self.position(end);
        tokens.push((Token::Eof, Span::new(end, end, line, column)));
        Ok(tokens)
    }
}

//! Parser implementation for syscall table lines.
//!
//! A definition line is first split into tokens (words and the punctuation
//! `(`, `)`, `,` and `*`), then walked by a small recursive-descent parser.
//! Every failure names the grammar element that was expected and the column
//! where the parser stopped.

use std::iter::Peekable;
use std::vec;

use super::ast;
use super::DEF_SYSCALL;
use crate::common::error::{Error, ErrorKind, Result, Span};

/// Represents the different kinds of tokens found on a definition line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    /// A run of `[A-Za-z0-9_]`: keywords, names, numbers and type names
    Word,
    /// One of `(`, `)`, `,`, `*`
    Punct(char),
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    /// Byte offset of the first character
    start: usize,
    /// Byte offset one past the last character
    end: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(line: &str, span: &Span) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if is_word_char(c) {
            let mut end = start + c.len_utf8();
            while let Some(&(i, c)) = chars.peek() {
                if !is_word_char(c) {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            tokens.push(Token {
                kind: TokenKind::Word,
                start,
                end,
            });
            continue;
        }
        match c {
            '(' | ')' | ',' | '*' => tokens.push(Token {
                kind: TokenKind::Punct(c),
                start,
                end: start + 1,
            }),
            _ => {
                return Err(Error::new(
                    ErrorKind::Grammar,
                    format!("unexpected character {:?}", c),
                    span.at(line[..start].chars().count() + 1),
                ))
            }
        }
    }
    Ok(tokens)
}

/// Parser for a single `DEF_SYSCALL` line.
pub struct Parser<'a> {
    line: &'a str,
    span: Span,
    tokens: Peekable<vec::IntoIter<Token>>,
    /// Byte offset just past the last consumed token
    pos: usize,
}

impl<'a> Parser<'a> {
    /// Tokenizes `line`; `span` locates it in the table for error reporting.
    pub fn new(line: &'a str, span: Span) -> Result<Self> {
        let tokens = tokenize(line, &span)?;
        Ok(Self {
            line,
            span,
            tokens: tokens.into_iter().peekable(),
            pos: 0,
        })
    }

    /// Parses the whole line.
    ///
    /// ```text
    /// DEF_SYSCALL ( number , name , type , argc )
    /// DEF_SYSCALL ( number , name , type , argc , args )
    /// ```
    pub fn parse_definition(&mut self) -> Result<ast::Definition> {
        self.expect_keyword(DEF_SYSCALL)?;
        self.expect_punct('(', "'(' after DEF_SYSCALL")?;

        let number = self.parse_number()?;
        self.expect_punct(',', "',' after the syscall number")?;

        let name = self.parse_word("syscall name")?.to_string();
        self.expect_punct(',', "',' after the syscall name")?;

        let ret = self.parse_decl_text("return type", false)?;
        self.expect_punct(',', "',' after the return type")?;

        let argc = self.parse_count()?;

        let args = if self.eat_punct(')') {
            None
        } else {
            self.expect_punct(',', "')' or ',' after the argument count")?;
            let args = self.parse_decl_text("argument list", true)?;
            self.expect_punct(')', "')' closing the argument list")?;
            Some(args)
        };

        if let Some(tok) = self.tokens.peek().copied() {
            return Err(self.error_at(
                tok.start,
                format!(
                    "unexpected {:?} after the closing parenthesis",
                    &self.line[tok.start..tok.end]
                ),
            ));
        }

        Ok(ast::Definition {
            span: self.span.clone(),
            number,
            name,
            ret,
            argc,
            args,
        })
    }

    fn bump(&mut self) -> Option<Token> {
        self.tokens.next().map(|tok| {
            self.pos = tok.end;
            tok
        })
    }

    fn peek_kind(&mut self) -> Option<TokenKind> {
        self.tokens.peek().map(|tok| tok.kind)
    }

    fn text(&self, tok: Token) -> &'a str {
        &self.line[tok.start..tok.end]
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> Error {
        let column = self.line[..offset].chars().count() + 1;
        Error::new(ErrorKind::Grammar, message, self.span.at(column))
    }

    /// Error for a missing element, pointing at the next token or at the end
    /// of the line.
    fn expected(&mut self, what: &str) -> Error {
        match self.tokens.peek().copied() {
            Some(tok) => self.error_at(
                tok.start,
                format!("expected {}, found {:?}", what, self.text(tok)),
            ),
            None => self.error_at(self.line.len(), format!("expected {}, found end of line", what)),
        }
    }

    fn eat_punct(&mut self, ch: char) -> bool {
        if self.peek_kind() == Some(TokenKind::Punct(ch)) {
            self.bump();
            return true;
        }
        false
    }

    fn expect_punct(&mut self, ch: char, what: &str) -> Result<()> {
        if !self.eat_punct(ch) {
            return Err(self.expected(what));
        }
        Ok(())
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if let Some(tok) = self.tokens.peek().copied() {
            if tok.kind == TokenKind::Word && self.text(tok) == keyword {
                self.bump();
                return Ok(());
            }
        }
        Err(self.expected(&format!("'{}'", keyword)))
    }

    fn parse_word(&mut self, what: &str) -> Result<&'a str> {
        match self.peek_kind() {
            Some(TokenKind::Word) => {
                let tok = self.bump().ok_or_else(|| self.expected(what))?;
                Ok(self.text(tok))
            }
            _ => Err(self.expected(what)),
        }
    }

    /// Decimal or `0x`-prefixed hexadecimal syscall number.
    fn parse_number(&mut self) -> Result<ast::Number> {
        let start = self.tokens.peek().map_or(self.line.len(), |tok| tok.start);
        let text = self.parse_word("syscall number")?;

        let parsed = match text.strip_prefix("0x") {
            Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
                u64::from_str_radix(hex, 16)
            }
            None if text.chars().all(|c| c.is_ascii_digit()) => text.parse::<u64>(),
            _ => {
                return Err(self.error_at(
                    start,
                    format!(
                        "expected decimal or 0x-prefixed hexadecimal syscall number, found {:?}",
                        text
                    ),
                ))
            }
        };
        let value = parsed.map_err(|e| {
            self.error_at(start, format!("invalid syscall number {:?}: {}", text, e))
        })?;

        Ok(ast::Number {
            value,
            text: text.to_string(),
        })
    }

    fn parse_count(&mut self) -> Result<usize> {
        let start = self.tokens.peek().map_or(self.line.len(), |tok| tok.start);
        let text = self.parse_word("argument count")?;
        if !text.chars().all(|c| c.is_ascii_digit()) {
            return Err(self.error_at(
                start,
                format!("expected decimal argument count, found {:?}", text),
            ));
        }
        text.parse::<usize>()
            .map_err(|e| self.error_at(start, format!("invalid argument count {:?}: {}", text, e)))
    }

    /// Consumes words and `*` (and `,` when `commas` is set) up to the next
    /// separator and returns the raw text they span.
    ///
    /// The argument list may be empty so that `0, )` surfaces as an arity
    /// mismatch rather than a grammar error.
    fn parse_decl_text(&mut self, what: &str, commas: bool) -> Result<String> {
        let mut span: Option<(usize, usize)> = None;

        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::Word | TokenKind::Punct('*') => {}
                TokenKind::Punct(',') if commas => {}
                _ => break,
            }
            if let Some(tok) = self.bump() {
                span = Some(match span {
                    Some((start, _)) => (start, tok.end),
                    None => (tok.start, tok.end),
                });
            }
        }

        match span {
            Some((start, end)) => Ok(self.line[start..end].to_string()),
            None if commas => Ok(String::new()),
            None => Err(self.expected(what)),
        }
    }
}

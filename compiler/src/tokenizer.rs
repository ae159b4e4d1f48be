use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::error::ThriftError;

lazy_static! {
    /// Every keyword in the full Thrift grammar, so the parser can reject the
    /// unsupported ones with a sensible message instead of a lexer failure.
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("enum", TokenKind::Enum);
        m.insert("union", TokenKind::Union);
        m.insert("struct", TokenKind::Struct);
        m.insert("list", TokenKind::List);
        m.insert("bool", TokenKind::Bool);
        m.insert("byte", TokenKind::Byte);
        m.insert("uuid", TokenKind::Uuid);
        m.insert("i8", TokenKind::I8);
        m.insert("i16", TokenKind::I16);
        m.insert("i32", TokenKind::I32);
        m.insert("i64", TokenKind::I64);
        m.insert("double", TokenKind::Double);
        m.insert("string", TokenKind::String);
        m.insert("binary", TokenKind::Binary);
        m.insert("required", TokenKind::Required);
        m.insert("optional", TokenKind::Optional);
        m.insert("const", TokenKind::Const);
        m.insert("exception", TokenKind::Exception);
        m.insert("service", TokenKind::Service);
        m.insert("extends", TokenKind::Extends);
        m.insert("typedef", TokenKind::Typedef);
        m.insert("void", TokenKind::Void);
        m.insert("oneway", TokenKind::Oneway);
        m.insert("sink", TokenKind::Sink);
        m
    };
}

/// Top-level statements the lexer consumes whole, contributing no tokens.
pub const SKIP_STATEMENTS: [&str; 2] = ["include", "namespace"];

/// Identifiers that name grammar features the generator cannot yet emit
/// correct code for.
pub const UNSUPPORTED_IDENTS: [&str; 4] = ["map", "set", "cpp_type", "throws"];

/// Source position: byte offset into the source plus 1-based row/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub row:    usize,
    pub col:    usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // our subset of structural keywords
    Enum,
    Union,
    Struct,
    List,

    // the remaining Thrift keywords (so the parser can handle types, etc.)
    Bool,
    Byte,
    Uuid,
    I8,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
    Required,
    Optional,
    Const,
    Exception,
    Service,
    Extends,
    Typedef,
    Void,
    Oneway,
    Sink,

    // integer constant for field tags, default values, etc.
    IntConst,

    // identifiers for names
    Ident,

    // punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    Lt,
    Gt,
    Semicolon,
    Comma,
    Colon,
    Equal,
}

/// A token carries only its kind and position range; the text is sliced from
/// the source by `start.offset..end.offset` on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind:  TokenKind,
    pub start: Pos,
    pub end:   Pos,
}

/// Character-driven lexer for the Thrift subset:
///   - enum, union, struct, list<...>
///   - base types (i32, string, etc.) as keywords
///   - signed integer constants for field tags/defaults
///   - identifiers for names
///
/// Skips whitespace, comments, include/namespace statements, and all
/// `@annotations`. Fails on `map`, `set`, `cpp_type`, `throws`.
pub struct Lexer<'a> {
    src:    &'a str,
    offset: usize,
    row:    usize,
    col:    usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src,
            offset: 0,
            row: 1,
            col: 1,
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            offset: self.offset,
            row:    self.row,
            col:    self.col,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut it = self.src[self.offset..].chars();
        it.next();
        it.next()
    }

    /// Consume one character, advancing the position even through comments
    /// and skipped statements so diagnostics stay exact.
    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.row += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ThriftError> {
        // the leading "/*" was already consumed
        loop {
            match self.peek() {
                Some('*') if self.peek_next() == Some('/') => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                Some(_) => {
                    self.advance();
                }
                None => {
                    return Err(ThriftError::UnterminatedComment {
                        line:   self.row,
                        column: self.col,
                    })
                }
            }
        }
    }

    /// Skip `@name`, `@name = "value"`, or `@name = 123` entirely.
    /// Annotations carry no semantic effect in this subset.
    fn skip_annotation(&mut self) -> Result<(), ThriftError> {
        self.advance(); // '@'
        match self.peek() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
            _ => {
                return Err(ThriftError::BadAnnotation {
                    line:   self.row,
                    column: self.col,
                })
            }
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        while matches!(self.peek(), Some(ch) if ch.is_ascii_whitespace()) {
            self.advance();
        }
        if self.peek() == Some('=') {
            self.advance();
            while matches!(self.peek(), Some(ch) if ch.is_ascii_whitespace()) {
                self.advance();
            }
            if self.peek() == Some('"') {
                self.advance();
                while let Some(ch) = self.peek() {
                    if ch == '\\' {
                        self.advance();
                        self.advance();
                    } else if ch == '"' {
                        self.advance();
                        break;
                    } else {
                        self.advance();
                    }
                }
            } else {
                while matches!(self.peek(), Some(ch) if ch.is_ascii_digit() || ch == '+' || ch == '-')
                {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    /// Consume the rest of an `include`/`namespace` statement through the
    /// terminating `;`. A `/` yields back to the main loop so comments are
    /// handled there.
    fn skip_statement(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ';' => break,
                '/' => return,
                _ => {
                    self.advance();
                }
            }
        }
        if self.peek() == Some(';') {
            self.advance();
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, ThriftError> {
        loop {
            let ch = match self.peek() {
                Some(ch) => ch,
                None => return Ok(None),
            };

            // whitespace
            if ch.is_ascii_whitespace() {
                self.advance();
                continue;
            }

            // comments
            if ch == '/' && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                self.skip_line_comment();
                continue;
            }
            if ch == '/' && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                self.skip_block_comment()?;
                continue;
            }

            // annotations
            if ch == '@' {
                self.skip_annotation()?;
                continue;
            }

            let start = self.pos();

            // integer constants: ['+'|'-']? Digit+
            if ch.is_ascii_digit() || ch == '+' || ch == '-' {
                if ch == '+' || ch == '-' {
                    self.advance();
                }
                if !matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    return Err(ThriftError::InvalidIntegerLiteral {
                        line:   self.row,
                        column: self.col,
                    });
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
                return Ok(Some(Token {
                    kind:  TokenKind::IntConst,
                    start,
                    end:   self.pos(),
                }));
            }

            // identifiers & keywords
            if ch.is_ascii_alphabetic() || ch == '_' {
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
                    self.advance();
                }
                let word = &self.src[start.offset..self.offset];

                if SKIP_STATEMENTS.contains(&word) {
                    self.skip_statement();
                    continue;
                }
                if UNSUPPORTED_IDENTS.contains(&word) {
                    return Err(ThriftError::Unsupported {
                        feature: word.to_string(),
                        line:    start.row,
                        column:  start.col,
                    });
                }

                let kind = KEYWORDS.get(word).copied().unwrap_or(TokenKind::Ident);
                return Ok(Some(Token {
                    kind,
                    start,
                    end: self.pos(),
                }));
            }

            // punctuation
            let kind = match ch {
                '{' => Some(TokenKind::LBrace),
                '}' => Some(TokenKind::RBrace),
                '(' => Some(TokenKind::LParen),
                ')' => Some(TokenKind::RParen),
                '<' => Some(TokenKind::Lt),
                '>' => Some(TokenKind::Gt),
                ';' => Some(TokenKind::Semicolon),
                ',' => Some(TokenKind::Comma),
                ':' => Some(TokenKind::Colon),
                '=' => Some(TokenKind::Equal),
                _ => None,
            };
            if let Some(kind) = kind {
                self.advance();
                return Ok(Some(Token {
                    kind,
                    start,
                    end: self.pos(),
                }));
            }

            return Err(ThriftError::UnexpectedCharacter {
                ch,
                line:   start.row,
                column: start.col,
            });
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, ThriftError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Materialize the whole token stream.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ThriftError> {
    Lexer::new(src).collect()
}

//! Lexical analyzer

use std::iter::Peekable;
use std::str::Chars;

use crate::token::{Position, Token, TokenKind};

/// Turn source text into a sequence of tokens.
///
/// Scanning never fails: characters that cannot start a token are reported as
/// `TokenKind::Illegal` and left for the parser to diagnose.
#[derive(Debug)]
pub struct Scanner<'a> {
    input: Peekable<Chars<'a>>,
    line: u32,
    column: u32,

    // Buffer used when scanning longer tokens.  Allocated here to reuse memory.
    buf: String,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner operating on `input`.
    pub fn new(input: &'a str) -> Scanner<'a> {
        Scanner {
            input: input.chars().peekable(),
            line: 1,
            column: 0,
            buf: String::new(),
        }
    }

    /// Scan next token and return it.  Keeps returning `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            let pos = self.current_pos();
            let ch = match self.bump() {
                None => return Token::new(TokenKind::Eof, "", pos),
                Some(ch) => ch,
            };
            let kind = match ch {
                ' ' | '\t' | '\r' | '\n' => continue,
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '+' => self.either(
                    &[('+', TokenKind::PlusPlus), ('=', TokenKind::PlusAssign)],
                    TokenKind::Plus,
                ),
                '-' => self.either(
                    &[('-', TokenKind::MinusMinus), ('=', TokenKind::MinusAssign)],
                    TokenKind::Minus,
                ),
                '*' => self.either(
                    &[('*', TokenKind::StarStar), ('=', TokenKind::StarAssign)],
                    TokenKind::Star,
                ),
                '/' => {
                    if self.eat('/') {
                        self.either(&[('=', TokenKind::SlashSlashAssign)], TokenKind::SlashSlash)
                    } else {
                        self.either(&[('=', TokenKind::SlashAssign)], TokenKind::Slash)
                    }
                }
                '%' => TokenKind::Percent,
                '=' => self.either(&[('=', TokenKind::EqualEqual)], TokenKind::Assign),
                '!' => self.either(&[('=', TokenKind::BangEqual)], TokenKind::Bang),
                '<' => self.either(&[('=', TokenKind::LessEqual)], TokenKind::Less),
                '>' => self.either(&[('=', TokenKind::GreaterEqual)], TokenKind::Greater),
                '&' => self.either(&[('&', TokenKind::AndAnd)], TokenKind::Illegal),
                '|' => self.either(&[('|', TokenKind::OrOr)], TokenKind::Illegal),
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                ':' => TokenKind::Colon,
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '{' => TokenKind::LeftCurly,
                '}' => TokenKind::RightCurly,
                '[' => TokenKind::LeftBracket,
                ']' => TokenKind::RightBracket,
                '"' => return self.scan_string(pos),
                '0'..='9' => return self.scan_number(ch, pos),
                'a'..='z' | 'A'..='Z' | '_' => return self.scan_identifier(ch, pos),
                _ => return Token::new(TokenKind::Illegal, ch.to_string(), pos),
            };
            return match kind {
                // Lone '&' or '|'.
                TokenKind::Illegal => Token::new(kind, ch.to_string(), pos),
                _ => Token::new(kind, kind.to_string(), pos),
            };
        }
    }

    fn current_pos(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.input.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.input.peek() == Some(&expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Pick a two-character token if the next character matches one of `pairs`.
    fn either(&mut self, pairs: &[(char, TokenKind)], single: TokenKind) -> TokenKind {
        for (next, kind) in pairs {
            if self.eat(*next) {
                return *kind;
            }
        }
        single
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.input.peek() {
            if *ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn scan_number(&mut self, first_digit: char, pos: Position) -> Token {
        self.buf.clear();
        self.buf.push(first_digit);
        let mut kind = TokenKind::Int;
        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                self.buf.push(ch);
            } else if ch == '.' {
                // Literals such as "1.2.3" are kept whole so the parser can reject them.
                kind = TokenKind::Float;
                self.buf.push(ch);
            } else {
                break;
            }
            self.bump();
        }
        Token::new(kind, self.buf.as_str(), pos)
    }

    fn scan_identifier(&mut self, first_char: char, pos: Position) -> Token {
        self.buf.clear();
        self.buf.push(first_char);
        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.buf.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        let kind = TokenKind::keyword(&self.buf).unwrap_or(TokenKind::Identifier);
        Token::new(kind, self.buf.as_str(), pos)
    }

    fn scan_string(&mut self, pos: Position) -> Token {
        self.buf.clear();
        loop {
            match self.bump() {
                Some('"') => return Token::new(TokenKind::Str, self.buf.as_str(), pos),
                Some(ch) => self.buf.push(ch),
                None => {
                    let literal = format!("\"{}", self.buf);
                    return Token::new(TokenKind::Illegal, literal, pos);
                }
            }
        }
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.is(TokenKind::Eof) {
            None
        } else {
            Some(token)
        }
    }
}

//! Precedence-climbing parser.
//!
//! Errors do not stop the parse: each one is recorded as a [`Diagnostic`] and
//! the offending construct is dropped, so a single pass reports as many
//! problems as possible.  A program that came with diagnostics must not be
//! evaluated.

use tracing::trace;

use crate::ast::{Block, Expr, Ident, InfixOp, PrefixOp, Program, Stmt};
use crate::diag::{Diagnostic, ParseError, SyntaxErrors};
use crate::scanner::Scanner;
use crate::token::{Position, Token, TokenKind};

/// Binding strength of operators, weakest first.
#[derive(Debug, PartialEq, PartialOrd, Clone, Copy)]
enum Precedence {
    Lowest,
    Logical,
    Equals,
    LessGreater,
    Sum,
    Product,
    Exponent,
    Prefix,
    Call,
}

fn precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::AndAnd | TokenKind::OrOr => Precedence::Logical,
        TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equals,
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEqual | TokenKind::GreaterEqual => {
            Precedence::LessGreater
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash | TokenKind::Percent => {
            Precedence::Product
        }
        TokenKind::StarStar => Precedence::Exponent,
        TokenKind::LeftParen
        | TokenKind::LeftBracket
        | TokenKind::PlusPlus
        | TokenKind::MinusMinus => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn infix_op(kind: TokenKind) -> Option<InfixOp> {
    let op = match kind {
        TokenKind::Plus => InfixOp::Add,
        TokenKind::Minus => InfixOp::Sub,
        TokenKind::Star => InfixOp::Mul,
        TokenKind::Slash => InfixOp::Div,
        TokenKind::SlashSlash => InfixOp::FloorDiv,
        TokenKind::Percent => InfixOp::Mod,
        TokenKind::StarStar => InfixOp::Pow,
        TokenKind::EqualEqual => InfixOp::Eq,
        TokenKind::BangEqual => InfixOp::NotEq,
        TokenKind::Less => InfixOp::Less,
        TokenKind::Greater => InfixOp::Greater,
        TokenKind::LessEqual => InfixOp::LessEq,
        TokenKind::GreaterEqual => InfixOp::GreaterEq,
        TokenKind::AndAnd => InfixOp::And,
        TokenKind::OrOr => InfixOp::Or,
        _ => return None,
    };
    Some(op)
}

/// Operator a compound assignment such as `+=` stands for.
fn compound_op(kind: TokenKind) -> Option<InfixOp> {
    match kind {
        TokenKind::PlusAssign => Some(InfixOp::Add),
        TokenKind::MinusAssign => Some(InfixOp::Sub),
        TokenKind::StarAssign => Some(InfixOp::Mul),
        TokenKind::SlashAssign => Some(InfixOp::Div),
        TokenKind::SlashSlashAssign => Some(InfixOp::FloorDiv),
        _ => None,
    }
}

/// Give an anonymous function literal the name it is bound to.
fn name_function(mut value: Expr, binding: &str) -> Expr {
    if let Expr::Function { name, .. } = &mut value {
        if name.is_none() {
            *name = Some(binding.to_string());
        }
    }
    value
}

/// Parse `input` and return the program along with every diagnostic found.
pub fn parse(input: &str) -> (Program, SyntaxErrors) {
    let mut parser = Parser::new(input);
    let prg = parser.parse_program();
    (prg, parser.into_errors())
}

#[derive(Debug)]
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    peek: Token,
    errors: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Parser<'a> {
        let mut scanner = Scanner::new(input);
        let current = scanner.next_token();
        let peek = scanner.next_token();
        Parser {
            scanner,
            current,
            peek,
            errors: vec![],
        }
    }

    pub fn into_errors(self) -> SyntaxErrors {
        SyntaxErrors(self.errors)
    }

    pub fn parse_program(&mut self) -> Program {
        let mut statements = vec![];
        while !self.current.is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Program { statements }
    }

    fn next_token(&mut self) {
        let next = self.scanner.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn error(&mut self, pos: Position, error: ParseError) {
        trace!(%pos, %error, "syntax error");
        self.errors.push(Diagnostic { pos, error });
    }

    fn unexpected(&mut self, token: &Token, expected: &str) {
        let error = ParseError::UnexpectedToken {
            found: token.to_string(),
            expected: expected.to_string(),
        };
        self.error(token.pos, error);
    }

    /// Advance if the next token has the expected kind, report it otherwise.
    fn expect_peek(&mut self, expected: TokenKind) -> bool {
        if self.peek.is(expected) {
            self.next_token();
            true
        } else {
            let peek = self.peek.clone();
            self.unexpected(&peek, &expected.to_string());
            false
        }
    }

    fn identifier(&mut self) -> Option<Ident> {
        if self.current.is(TokenKind::Identifier) {
            Some(self.current.literal.clone())
        } else {
            let current = self.current.clone();
            self.unexpected(&current, &TokenKind::Identifier.to_string());
            None
        }
    }

    /// Parse a statement and swallow its optional trailing semicolon.
    fn parse_statement(&mut self) -> Option<Stmt> {
        // Empty statement.
        if self.current.is(TokenKind::Semicolon) {
            return None;
        }
        let stmt = self.parse_simple_statement();
        if self.peek.is(TokenKind::Semicolon) {
            self.next_token();
        }
        stmt
    }

    fn parse_simple_statement(&mut self) -> Option<Stmt> {
        match self.current.kind {
            TokenKind::Let | TokenKind::Const => self.parse_binding(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Identifier
                if self.peek.is(TokenKind::Assign) || compound_op(self.peek.kind).is_some() =>
            {
                self.parse_assignment()
            }
            TokenKind::Identifier
                if self.peek.is(TokenKind::PlusPlus) || self.peek.is(TokenKind::MinusMinus) =>
            {
                self.parse_postfix_statement()
            }
            _ => self.parse_expression(Precedence::Lowest).map(Stmt::Expr),
        }
    }

    /// `let name = value` or `const name = value`.
    fn parse_binding(&mut self) -> Option<Stmt> {
        let is_const = self.current.is(TokenKind::Const);
        if !self.expect_peek(TokenKind::Identifier) {
            return None;
        }
        let name = self.current.literal.clone();
        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();
        let value = name_function(self.parse_expression(Precedence::Lowest)?, &name);
        if is_const {
            Some(Stmt::Const { name, value })
        } else {
            Some(Stmt::Let { name, value })
        }
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        if self.peek.is(TokenKind::Semicolon)
            || self.peek.is(TokenKind::RightCurly)
            || self.peek.is(TokenKind::Eof)
        {
            return Some(Stmt::Return(Expr::Null));
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Return(value))
    }

    /// `name = value`, `name += value`, ...
    fn parse_assignment(&mut self) -> Option<Stmt> {
        let name = self.current.literal.clone();
        self.next_token();
        let op = compound_op(self.current.kind);
        self.next_token();
        let rhs = self.parse_expression(Precedence::Lowest)?;
        let value = match op {
            Some(op) => Expr::infix(Expr::Ident(name.clone()), op, rhs),
            None => name_function(rhs, &name),
        };
        Some(Stmt::Assign { name, value })
    }

    /// `name++` / `name--`.
    fn parse_postfix_statement(&mut self) -> Option<Stmt> {
        let name = self.current.literal.clone();
        self.next_token();
        let op = if self.current.is(TokenKind::PlusPlus) {
            InfixOp::Add
        } else {
            InfixOp::Sub
        };
        let value = Expr::infix(Expr::Ident(name.clone()), op, Expr::Int(1));
        Some(Stmt::Assign { name, value })
    }

    fn parse_expression(&mut self, prec: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;
        while !self.peek.is(TokenKind::Semicolon) && prec < precedence(self.peek.kind) {
            self.next_token();
            left = self.parse_infix(left)?;
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.current.kind {
            TokenKind::Identifier => Some(Expr::Ident(self.current.literal.clone())),
            TokenKind::Int => match self.current.literal.parse::<i64>() {
                Ok(n) => Some(Expr::Int(n)),
                Err(_) => {
                    let error = ParseError::BadIntegerLiteral(self.current.literal.clone());
                    self.error(self.current.pos, error);
                    None
                }
            },
            TokenKind::Float => match self.current.literal.parse::<f64>() {
                Ok(n) => Some(Expr::Float(n)),
                Err(_) => {
                    let error = ParseError::BadFloatLiteral(self.current.literal.clone());
                    self.error(self.current.pos, error);
                    None
                }
            },
            TokenKind::Str => Some(Expr::Str(self.current.literal.clone())),
            TokenKind::True => Some(Expr::Bool(true)),
            TokenKind::False => Some(Expr::Bool(false)),
            TokenKind::Null => Some(Expr::Null),
            TokenKind::Bang | TokenKind::Minus => {
                let op = if self.current.is(TokenKind::Bang) {
                    PrefixOp::Not
                } else {
                    PrefixOp::Neg
                };
                self.next_token();
                let right = self.parse_expression(Precedence::Prefix)?;
                Some(Expr::Prefix {
                    op,
                    right: Box::new(right),
                })
            }
            TokenKind::LeftParen => {
                self.next_token();
                let expr = self.parse_expression(Precedence::Lowest)?;
                if !self.expect_peek(TokenKind::RightParen) {
                    return None;
                }
                Some(expr)
            }
            TokenKind::LeftBracket => self
                .parse_expression_list(TokenKind::RightBracket)
                .map(Expr::Array),
            TokenKind::LeftCurly => self.parse_hash(),
            TokenKind::If => self.parse_if(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Fn => {
                let (params, body) = self.parse_params_and_body()?;
                Some(Expr::Function {
                    name: None,
                    params,
                    body,
                })
            }
            TokenKind::Macro => {
                let (params, body) = self.parse_params_and_body()?;
                Some(Expr::Macro { params, body })
            }
            TokenKind::Illegal => {
                let error = ParseError::IllegalToken(self.current.literal.clone());
                self.error(self.current.pos, error);
                None
            }
            _ => {
                let error = ParseError::NoPrefixRule(self.current.to_string());
                self.error(self.current.pos, error);
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        match self.current.kind {
            TokenKind::LeftParen => {
                let args = self.parse_expression_list(TokenKind::RightParen)?;
                Some(Expr::Call {
                    callee: Box::new(left),
                    args,
                })
            }
            TokenKind::LeftBracket => {
                self.next_token();
                let index = self.parse_expression(Precedence::Lowest)?;
                if !self.expect_peek(TokenKind::RightBracket) {
                    return None;
                }
                Some(Expr::Index {
                    left: Box::new(left),
                    index: Box::new(index),
                })
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = self.current.literal.clone();
                let target = left.to_string();
                let error = match left {
                    Expr::Ident(_) => ParseError::PostfixNotStatement { op, target },
                    _ => ParseError::BadPostfixTarget { op, target },
                };
                self.error(self.current.pos, error);
                None
            }
            kind => {
                // Only tokens with an infix precedence get here.
                let op = infix_op(kind)?;
                let prec = precedence(kind);
                self.next_token();
                // Exponentiation is right-associative.
                let right_prec = if op == InfixOp::Pow {
                    Precedence::Product
                } else {
                    prec
                };
                let right = self.parse_expression(right_prec)?;
                Some(Expr::infix(left, op, right))
            }
        }
    }

    /// Comma-separated expressions up to `end`.  Current token is the opening delimiter.
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut items = vec![];
        if self.peek.is(end) {
            self.next_token();
            return Some(items);
        }
        self.next_token();
        items.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek.is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            items.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(items)
    }

    fn parse_hash(&mut self) -> Option<Expr> {
        let mut pairs = vec![];
        while !self.peek.is(TokenKind::RightCurly) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if !self.peek.is(TokenKind::RightCurly) && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }
        self.next_token();
        Some(Expr::Hash(pairs))
    }

    /// Statements between `{` and `}`.  Current token is the opening curly.
    fn parse_block(&mut self) -> Option<Block> {
        let mut statements = vec![];
        self.next_token();
        while !self.current.is(TokenKind::RightCurly) {
            if self.current.is(TokenKind::Eof) {
                let eof = self.current.clone();
                self.unexpected(&eof, "}");
                return None;
            }
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Some(Block { statements })
    }

    /// A condition followed by a block.  Current token is the keyword.
    fn parse_guarded_block(&mut self) -> Option<(Expr, Block)> {
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::LeftCurly) {
            return None;
        }
        let block = self.parse_block()?;
        Some((condition, block))
    }

    fn parse_if(&mut self) -> Option<Expr> {
        let mut clauses = vec![self.parse_guarded_block()?];
        let mut alternative = None;
        while self.peek.is(TokenKind::Else) {
            self.next_token();
            if self.peek.is(TokenKind::If) {
                self.next_token();
                clauses.push(self.parse_guarded_block()?);
            } else {
                if !self.expect_peek(TokenKind::LeftCurly) {
                    return None;
                }
                alternative = Some(self.parse_block()?);
                break;
            }
        }
        Some(Expr::If {
            clauses,
            alternative,
        })
    }

    fn parse_while(&mut self) -> Option<Expr> {
        let (condition, body) = self.parse_guarded_block()?;
        Some(Expr::While {
            condition: Box::new(condition),
            body,
        })
    }

    /// `for (init; condition; afterthought) { body }`.
    fn parse_for(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::LeftParen) {
            return None;
        }
        self.next_token();
        let init = self.parse_simple_statement()?;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        self.next_token();
        let afterthought = self.parse_simple_statement()?;
        if !self.expect_peek(TokenKind::RightParen) || !self.expect_peek(TokenKind::LeftCurly) {
            return None;
        }
        let body = self.parse_block()?;
        Some(Expr::For {
            init: Box::new(init),
            condition: Box::new(condition),
            afterthought: Box::new(afterthought),
            body,
        })
    }

    fn parse_switch(&mut self) -> Option<Expr> {
        self.next_token();
        let subject = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::LeftCurly) {
            return None;
        }
        self.next_token();

        let mut cases = vec![];
        let mut default = None;
        loop {
            match self.current.kind {
                TokenKind::Case if default.is_none() => {
                    self.next_token();
                    let value = self.parse_expression(Precedence::Lowest)?;
                    if !self.expect_peek(TokenKind::Colon) {
                        return None;
                    }
                    self.next_token();
                    cases.push((value, self.parse_case_body()?));
                }
                TokenKind::Default if default.is_none() => {
                    if !self.expect_peek(TokenKind::Colon) {
                        return None;
                    }
                    self.next_token();
                    default = Some(self.parse_case_body()?);
                }
                TokenKind::RightCurly => break,
                _ => {
                    let current = self.current.clone();
                    let expected = if default.is_some() { "}" } else { "case" };
                    self.unexpected(&current, expected);
                    return None;
                }
            }
        }

        if cases.is_empty() {
            self.error(self.current.pos, ParseError::MissingCase);
            return None;
        }
        Some(Expr::Switch {
            subject: Box::new(subject),
            cases,
            default,
        })
    }

    /// Statements up to the next `case`, `default` or closing curly, which is
    /// left as the current token.
    fn parse_case_body(&mut self) -> Option<Block> {
        let mut statements = vec![];
        loop {
            match self.current.kind {
                TokenKind::Case | TokenKind::Default | TokenKind::RightCurly => break,
                TokenKind::Eof => {
                    let eof = self.current.clone();
                    self.unexpected(&eof, "}");
                    return None;
                }
                _ => {
                    if let Some(stmt) = self.parse_statement() {
                        statements.push(stmt);
                    }
                    self.next_token();
                }
            }
        }
        Some(Block { statements })
    }

    /// `(a, b) { body }` after `fn` or `macro`.
    fn parse_params_and_body(&mut self) -> Option<(Vec<Ident>, Block)> {
        if !self.expect_peek(TokenKind::LeftParen) {
            return None;
        }
        let mut params = vec![];
        if self.peek.is(TokenKind::RightParen) {
            self.next_token();
        } else {
            self.next_token();
            params.push(self.identifier()?);
            while self.peek.is(TokenKind::Comma) {
                self.next_token();
                self.next_token();
                params.push(self.identifier()?);
            }
            if !self.expect_peek(TokenKind::RightParen) {
                return None;
            }
        }
        if !self.expect_peek(TokenKind::LeftCurly) {
            return None;
        }
        let body = self.parse_block()?;
        Some((params, body))
    }
}

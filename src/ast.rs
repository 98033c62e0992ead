//! Syntax tree produced by the parser and consumed by the evaluator.
//!
//! Every node renders back to source through `Display`.  Prefix and infix
//! expressions are fully parenthesized so the rendering shows how precedence
//! was resolved: `a + b * c` renders as `(a + (b * c))`.

use std::fmt;

pub type Ident = String;

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Let { name: Ident, value: Expr },
    Const { name: Ident, value: Expr },
    /// Plain assignment.  Compound assignments and postfix `++`/`--` are
    /// desugared into this form by the parser.
    Assign { name: Ident, value: Expr },
    Return(Expr),
    Expr(Expr),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PrefixOp {
    Not,
    Neg,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    And,
    Or,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Ident(Ident),
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Null,
    Array(Vec<Expr>),
    /// Key/value pairs in source order.
    Hash(Vec<(Expr, Expr)>),
    Prefix {
        op: PrefixOp,
        right: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        op: InfixOp,
        right: Box<Expr>,
    },
    /// `if`, any number of `else if`, optional `else`.  `clauses` is never empty.
    If {
        clauses: Vec<(Expr, Block)>,
        alternative: Option<Block>,
    },
    Switch {
        subject: Box<Expr>,
        cases: Vec<(Expr, Block)>,
        default: Option<Block>,
    },
    While {
        condition: Box<Expr>,
        body: Block,
    },
    For {
        init: Box<Stmt>,
        condition: Box<Expr>,
        afterthought: Box<Stmt>,
        body: Block,
    },
    Function {
        /// Inferred from the enclosing `let`/`const`/assignment, if any.
        name: Option<Ident>,
        params: Vec<Ident>,
        body: Block,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Macro {
        params: Vec<Ident>,
        body: Block,
    },
}

/// Any node of the tree.  This is the currency of [`crate::modify::modify`].
#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Program(Program),
    Block(Block),
    Stmt(Stmt),
    Expr(Expr),
}

impl Expr {
    pub fn ident(name: &str) -> Expr {
        Expr::Ident(name.to_string())
    }

    pub fn infix(left: Expr, op: InfixOp, right: Expr) -> Expr {
        Expr::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Literal text of the token that starts this expression.
    pub fn token_literal(&self) -> String {
        match self {
            Expr::Ident(name) => name.clone(),
            Expr::Int(n) => n.to_string(),
            Expr::Float(n) => format!("{:?}", n),
            Expr::Bool(b) => b.to_string(),
            Expr::Str(s) => s.clone(),
            Expr::Null => "null".to_string(),
            Expr::Array(_) => "[".to_string(),
            Expr::Hash(_) => "{".to_string(),
            Expr::Prefix { op, .. } => op.to_string(),
            Expr::Infix { op, .. } => op.to_string(),
            Expr::If { .. } => "if".to_string(),
            Expr::Switch { .. } => "switch".to_string(),
            Expr::While { .. } => "while".to_string(),
            Expr::For { .. } => "for".to_string(),
            Expr::Function { .. } => "fn".to_string(),
            Expr::Call { .. } => "(".to_string(),
            Expr::Index { .. } => "[".to_string(),
            Expr::Macro { .. } => "macro".to_string(),
        }
    }
}

impl Stmt {
    pub fn token_literal(&self) -> String {
        match self {
            Stmt::Let { .. } => "let".to_string(),
            Stmt::Const { .. } => "const".to_string(),
            Stmt::Assign { name, .. } => name.clone(),
            Stmt::Return(_) => "return".to_string(),
            Stmt::Expr(e) => e.token_literal(),
        }
    }
}

impl Node {
    pub fn token_literal(&self) -> String {
        match self {
            Node::Program(p) => p
                .statements
                .first()
                .map(Stmt::token_literal)
                .unwrap_or_default(),
            Node::Block(_) => "{".to_string(),
            Node::Stmt(s) => s.token_literal(),
            Node::Expr(e) => e.token_literal(),
        }
    }
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOp::Not => write!(f, "!"),
            PrefixOp::Neg => write!(f, "-"),
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::FloorDiv => "//",
            InfixOp::Mod => "%",
            InfixOp::Pow => "**",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
            InfixOp::Less => "<",
            InfixOp::Greater => ">",
            InfixOp::LessEq => "<=",
            InfixOp::GreaterEq => ">=",
            InfixOp::And => "&&",
            InfixOp::Or => "||",
        };
        f.write_str(s)
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for stmt in &self.statements {
            write!(f, "{} ", stmt)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value } => write!(f, "let {} = {};", name, value),
            Stmt::Const { name, value } => write!(f, "const {} = {};", name, value),
            Stmt::Assign { name, value } => write!(f, "{} = {};", name, value),
            Stmt::Return(value) => write!(f, "return {};", value),
            Stmt::Expr(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Float(n) => write!(f, "{:?}", n),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Str(s) => write!(f, "\"{}\"", s),
            Expr::Null => write!(f, "null"),
            Expr::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Expr::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Expr::Prefix { op, right } => write!(f, "({}{})", op, right),
            Expr::Infix { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::If {
                clauses,
                alternative,
            } => {
                for (i, (condition, consequence)) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " else ")?;
                    }
                    write!(f, "if {} {}", condition, consequence)?;
                }
                if let Some(alt) = alternative {
                    write!(f, " else {}", alt)?;
                }
                Ok(())
            }
            Expr::Switch {
                subject,
                cases,
                default,
            } => {
                write!(f, "switch {} {{ ", subject)?;
                for (value, block) in cases {
                    write!(f, "case {}: {} ", value, block)?;
                }
                if let Some(block) = default {
                    write!(f, "default: {} ", block)?;
                }
                write!(f, "}}")
            }
            Expr::While { condition, body } => write!(f, "while {} {}", condition, body),
            Expr::For {
                init,
                condition,
                afterthought,
                body,
            } => {
                let after = afterthought.to_string();
                write!(
                    f,
                    "for ({} {}; {}) {}",
                    init,
                    condition,
                    after.trim_end_matches(';'),
                    body
                )
            }
            Expr::Function { params, body, .. } => {
                write!(f, "fn(")?;
                write_list(f, params)?;
                write!(f, ") {}", body)
            }
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Index { left, index } => write!(f, "({}[{}])", left, index),
            Expr::Macro { params, body } => {
                write!(f, "macro(")?;
                write_list(f, params)?;
                write!(f, ") {}", body)
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Program(p) => write!(f, "{}", p),
            Node::Block(b) => write!(f, "{}", b),
            Node::Stmt(s) => write!(f, "{}", s),
            Node::Expr(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn let_statement_renders_as_source() {
        let prg = Program {
            statements: vec![Stmt::Let {
                name: "my_var".to_string(),
                value: Expr::ident("another_var"),
            }],
        };
        assert_eq!(prg.to_string(), "let my_var = another_var;");
    }

    #[test]
    fn nested_infix_is_parenthesized() {
        let e = Expr::infix(
            Expr::ident("a"),
            InfixOp::Add,
            Expr::infix(Expr::ident("b"), InfixOp::Mul, Expr::ident("c")),
        );
        assert_eq!(e.to_string(), "(a + (b * c))");
    }

    #[test]
    fn if_with_else_if_chain() {
        let e = Expr::If {
            clauses: vec![
                (
                    Expr::ident("a"),
                    Block {
                        statements: vec![Stmt::Expr(Expr::Int(1))],
                    },
                ),
                (
                    Expr::ident("b"),
                    Block {
                        statements: vec![Stmt::Expr(Expr::Int(2))],
                    },
                ),
            ],
            alternative: Some(Block::default()),
        };
        assert_eq!(e.to_string(), "if a { 1 } else if b { 2 } else { }");
    }

    #[test]
    fn token_literals() {
        assert_eq!(Expr::Int(5).token_literal(), "5");
        assert_eq!(Stmt::Return(Expr::Null).token_literal(), "return");
        assert_eq!(
            Node::Expr(Expr::Function {
                name: None,
                params: vec![],
                body: Block::default()
            })
            .token_literal(),
            "fn"
        );
    }
}

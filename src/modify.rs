//! Generic bottom-up tree rewrite.
//!
//! [`modify`] rebuilds a node from its rewritten children and then hands the
//! result to the rewrite function.  Children sit in typed slots (a call's
//! callee must be an expression, a function body must be a block, ...), so
//! every value coming back from the rewrite function is narrowed to the slot's
//! type.  When the narrowing fails the slot keeps its previous content.

use tracing::warn;

use crate::ast::{Block, Expr, Ident, Node, Program, Stmt};

type Rewrite<'f> = dyn FnMut(Node) -> Node + 'f;

/// Rewrite `node` bottom-up: children first, then `f` on the node itself.
///
/// The result is whatever `f` returns for the root.
pub fn modify<F: FnMut(Node) -> Node>(node: Node, mut f: F) -> Node {
    walk(node, &mut f)
}

/// Like [`modify`] but for a node of known type.  If `f` replaces the root by
/// a node of another kind, `value` is returned with only its children rewritten.
pub fn modify_as<T: Slot, F: FnMut(Node) -> Node>(value: T, mut f: F) -> T {
    rewrite(value, &mut f)
}

/// A position in the tree that only accepts one kind of node.
pub trait Slot: Clone + Sized {
    fn into_node(self) -> Node;
    fn from_node(node: Node) -> Option<Self>;
}

impl Slot for Program {
    fn into_node(self) -> Node {
        Node::Program(self)
    }

    fn from_node(node: Node) -> Option<Self> {
        match node {
            Node::Program(p) => Some(p),
            _ => None,
        }
    }
}

impl Slot for Block {
    fn into_node(self) -> Node {
        Node::Block(self)
    }

    fn from_node(node: Node) -> Option<Self> {
        match node {
            Node::Block(b) => Some(b),
            _ => None,
        }
    }
}

impl Slot for Stmt {
    fn into_node(self) -> Node {
        Node::Stmt(self)
    }

    fn from_node(node: Node) -> Option<Self> {
        match node {
            Node::Stmt(s) => Some(s),
            _ => None,
        }
    }
}

impl Slot for Expr {
    fn into_node(self) -> Node {
        Node::Expr(self)
    }

    fn from_node(node: Node) -> Option<Self> {
        match node {
            Node::Expr(e) => Some(e),
            _ => None,
        }
    }
}

fn walk(node: Node, f: &mut Rewrite<'_>) -> Node {
    let node = match node {
        Node::Program(p) => Node::Program(Program {
            statements: rewrite_all(p.statements, f),
        }),
        Node::Block(b) => Node::Block(walk_block(b, f)),
        Node::Stmt(s) => Node::Stmt(walk_stmt(s, f)),
        Node::Expr(e) => Node::Expr(walk_expr(e, f)),
    };
    f(node)
}

fn rewrite<T: Slot>(value: T, f: &mut Rewrite<'_>) -> T {
    let previous = value.clone();
    match T::from_node(walk(value.into_node(), f)) {
        Some(v) => v,
        None => {
            warn!(
                "rewrite produced a node of the wrong kind, keeping {}",
                previous.clone().into_node()
            );
            previous
        }
    }
}

fn rewrite_all<T: Slot>(values: Vec<T>, f: &mut Rewrite<'_>) -> Vec<T> {
    values.into_iter().map(|v| rewrite(v, f)).collect()
}

fn rewrite_boxed<T: Slot>(value: Box<T>, f: &mut Rewrite<'_>) -> Box<T> {
    Box::new(rewrite(*value, f))
}

/// Identifiers in binding position are offered to `f` as identifier expressions.
fn rewrite_ident(name: Ident, f: &mut Rewrite<'_>) -> Ident {
    match walk(Node::Expr(Expr::Ident(name.clone())), f) {
        Node::Expr(Expr::Ident(renamed)) => renamed,
        _ => name,
    }
}

fn walk_block(block: Block, f: &mut Rewrite<'_>) -> Block {
    Block {
        statements: rewrite_all(block.statements, f),
    }
}

fn walk_stmt(stmt: Stmt, f: &mut Rewrite<'_>) -> Stmt {
    match stmt {
        Stmt::Let { name, value } => Stmt::Let {
            name,
            value: rewrite(value, f),
        },
        Stmt::Const { name, value } => Stmt::Const {
            name,
            value: rewrite(value, f),
        },
        Stmt::Assign { name, value } => Stmt::Assign {
            name,
            value: rewrite(value, f),
        },
        Stmt::Return(value) => Stmt::Return(rewrite(value, f)),
        Stmt::Expr(e) => Stmt::Expr(rewrite(e, f)),
    }
}

fn walk_clauses(clauses: Vec<(Expr, Block)>, f: &mut Rewrite<'_>) -> Vec<(Expr, Block)> {
    clauses
        .into_iter()
        .map(|(e, b)| (rewrite(e, f), rewrite(b, f)))
        .collect()
}

fn walk_expr(expr: Expr, f: &mut Rewrite<'_>) -> Expr {
    match expr {
        Expr::Ident(_)
        | Expr::Int(_)
        | Expr::Float(_)
        | Expr::Bool(_)
        | Expr::Str(_)
        | Expr::Null => expr,
        Expr::Array(items) => Expr::Array(rewrite_all(items, f)),
        Expr::Hash(pairs) => Expr::Hash(
            pairs
                .into_iter()
                .map(|(k, v)| (rewrite(k, f), rewrite(v, f)))
                .collect(),
        ),
        Expr::Prefix { op, right } => Expr::Prefix {
            op,
            right: rewrite_boxed(right, f),
        },
        Expr::Infix { left, op, right } => Expr::Infix {
            left: rewrite_boxed(left, f),
            op,
            right: rewrite_boxed(right, f),
        },
        Expr::If {
            clauses,
            alternative,
        } => Expr::If {
            clauses: walk_clauses(clauses, f),
            alternative: alternative.map(|b| rewrite(b, f)),
        },
        Expr::Switch {
            subject,
            cases,
            default,
        } => Expr::Switch {
            subject: rewrite_boxed(subject, f),
            cases: walk_clauses(cases, f),
            default: default.map(|b| rewrite(b, f)),
        },
        Expr::While { condition, body } => Expr::While {
            condition: rewrite_boxed(condition, f),
            body: rewrite(body, f),
        },
        Expr::For {
            init,
            condition,
            afterthought,
            body,
        } => Expr::For {
            init: rewrite_boxed(init, f),
            condition: rewrite_boxed(condition, f),
            afterthought: rewrite_boxed(afterthought, f),
            body: rewrite(body, f),
        },
        Expr::Function { name, params, body } => Expr::Function {
            name,
            params: params.into_iter().map(|p| rewrite_ident(p, f)).collect(),
            body: rewrite(body, f),
        },
        Expr::Call { callee, args } => Expr::Call {
            callee: rewrite_boxed(callee, f),
            args: rewrite_all(args, f),
        },
        Expr::Index { left, index } => Expr::Index {
            left: rewrite_boxed(left, f),
            index: rewrite_boxed(index, f),
        },
        Expr::Macro { params, body } => Expr::Macro {
            params: params.into_iter().map(|p| rewrite_ident(p, f)).collect(),
            body: rewrite(body, f),
        },
    }
}

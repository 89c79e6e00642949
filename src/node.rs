use std::fmt::Display;
use std::ptr;

use serde::Serialize;

use crate::ast::{Expr, Stmt};

/// Label of a synthetic node that does not correspond to any statement.
///
/// `Start` marks the unit entry; the other three are the terminal nodes
/// control can escape to.
#[derive(PartialEq,Eq,Clone,Copy,Debug,Hash,Serialize)]
pub enum Annotation {
    Start,
    Leave,
    Raise,
    Return,
}

/// A reference from a control-flow node back into the analysed AST.
///
/// Most nodes point at the statement they were built from; the guard nodes
/// of typed `except` clauses point at the handler's type expression.
#[derive(Clone,Copy,Debug,Serialize)]
pub enum AstRef<'a> {
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> AstRef<'a> {
    pub fn as_stmt(&self) -> Option<&'a Stmt> {
        match self {
            AstRef::Stmt(stmt) => Some(stmt),
            AstRef::Expr(_) => None,
        }
    }

    pub fn as_expr(&self) -> Option<&'a Expr> {
        match self {
            AstRef::Stmt(_) => None,
            AstRef::Expr(expr) => Some(expr),
        }
    }

    /// Identity (not structural) comparison against a statement.
    pub fn is_stmt(&self, stmt: &Stmt) -> bool {
        match self {
            AstRef::Stmt(s) => ptr::eq(*s, stmt),
            AstRef::Expr(_) => false,
        }
    }
}

/// The payload of one node of the control-flow graph: at most one AST
/// back-reference and at most one annotation. Dummy placeholder nodes carry
/// neither; they only exist while the graph is under construction.
///
/// All edge structure lives in the graph; nodes compare by graph identity.
#[derive(Clone,Copy,Debug,Serialize)]
pub struct CfNode<'a> {
    pub ast: Option<AstRef<'a>>,
    pub annotation: Option<Annotation>,
}

impl<'a> CfNode<'a> {
    /// A node wrapping a statement.
    pub fn stmt(stmt: &'a Stmt) -> Self {
        CfNode { ast: Some(AstRef::Stmt(stmt)), annotation: None }
    }

    /// A node wrapping an expression (an `except` clause's type).
    pub fn expr(expr: &'a Expr) -> Self {
        CfNode { ast: Some(AstRef::Expr(expr)), annotation: None }
    }

    /// A synthetic annotated node.
    pub fn annotated(annotation: Annotation) -> Self {
        CfNode { ast: None, annotation: Some(annotation) }
    }

    /// A placeholder node, to be collapsed or removed before the analysis
    /// is returned.
    pub fn dummy() -> Self {
        CfNode { ast: None, annotation: None }
    }

    /// True for nodes with no AST back-reference.
    pub fn is_synthetic(&self) -> bool {
        self.ast.is_none()
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Annotation::Start => "<start>",
            Annotation::Leave => "<leave>",
            Annotation::Raise => "<raise>",
            Annotation::Return => "<return>",
        };
        write!(f, "{}", label)
    }
}

impl Display for CfNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.annotation, &self.ast) {
            (Some(annotation), _) => write!(f, "{}", annotation),
            (None, Some(AstRef::Stmt(stmt))) => write!(f, "{}", stmt),
            (None, Some(AstRef::Expr(expr))) => write!(f, "{}", expr),
            (None, None) => write!(f, "<dummy>"),
        }
    }
}

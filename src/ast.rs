use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

//////////////////
// Source units //
//////////////////

/// A module: the sequence of top-level statements of one source file.
#[derive(PartialEq,Clone,Debug,Serialize,Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

/// A function or coroutine definition.
#[derive(PartialEq,Clone,Debug,Serialize,Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub is_async: bool,
}

/// A class definition.
#[derive(PartialEq,Clone,Debug,Serialize,Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub body: Vec<Stmt>,
}

////////////////
// Statements //
////////////////

/// One name binding of an import statement: `name` or `name as asname`.
#[derive(PartialEq,Clone,Debug,Serialize,Deserialize)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

/// One `except` clause of a `try` statement. A clause without a type
/// expression is a bare `except:`, which matches every exception.
#[derive(PartialEq,Clone,Debug,Serialize,Deserialize)]
pub struct ExceptHandler {
    pub typ: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

/// One context manager of a `with` statement: `context as target`.
#[derive(PartialEq,Clone,Debug,Serialize,Deserialize)]
pub struct WithItem {
    pub context: Expr,
    pub target: Option<Expr>,
}

/// Statements of the analysed language.
///
/// `for`/`with`/`def` and their `async` forms differ only in keywords, not
/// in control flow, so each pair shares a variant with an `is_async` flag.
#[derive(PartialEq,Clone,Debug,Serialize,Deserialize)]
pub enum Stmt {
    Pass,
    Break,
    Continue,
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    /// An expression evaluated for its side effects.
    Expr(Expr),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    Delete(Vec<Expr>),
    Import(Vec<Alias>),
    ImportFrom {
        module: Option<String>,
        names: Vec<Alias>,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Return(Option<Expr>),
    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        is_async: bool,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        is_async: bool,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
}

/////////////////
// Expressions //
/////////////////

/// Expressions of the analysed language.
///
/// The analyser only ever inspects `Constant`; every other variant is
/// opaque to it and exists so that realistic statements can be represented
/// and displayed.
#[derive(PartialEq,Clone,Debug,Serialize,Deserialize)]
pub enum Expr {
    Constant(Constant),
    Name(String),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    Compare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Yield(Option<Box<Expr>>),
    Await(Box<Expr>),
}

impl Expr {
    /// Interpret this expression as a compile-time constant, if it is one.
    ///
    /// Only syntactically obvious literals are recognised; no arithmetic or
    /// call evaluation is performed.
    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expr::Constant(c) => Some(c),
            _ => None,
        }
    }
}

/// Literal constant values.
#[derive(PartialEq,Clone,Debug,Serialize,Deserialize)]
pub enum Constant {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex { real: f64, imag: f64 },
    Str(String),
    Bytes(Vec<u8>),
    Ellipsis,
}

impl Constant {
    /// Truthiness under the source-language rules: zero and empty values
    /// are falsy, everything else is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Constant::None => false,
            Constant::Bool(b) => *b,
            Constant::Int(n) => *n != 0,
            Constant::Float(x) => *x != 0.0,
            Constant::Complex { real, imag } => *real != 0.0 || *imag != 0.0,
            Constant::Str(s) => !s.is_empty(),
            Constant::Bytes(b) => !b.is_empty(),
            Constant::Ellipsis => true,
        }
    }
}

#[derive(PartialEq,Eq,Clone,Copy,Debug,Serialize,Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(PartialEq,Eq,Clone,Copy,Debug,Serialize,Deserialize)]
pub enum UnaryOp {
    Not,
    UAdd,
    USub,
    Invert,
}

#[derive(PartialEq,Eq,Clone,Copy,Debug,Serialize,Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(PartialEq,Eq,Clone,Copy,Debug,Serialize,Deserialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

/////////////////////
// Pretty-printing //
/////////////////////

impl Display for Stmt {
    /// Display a statement as its one-line header; suites are elided.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stmt::Pass => write!(f, "pass"),
            Stmt::Break => write!(f, "break"),
            Stmt::Continue => write!(f, "continue"),
            Stmt::Global(names) => write!(f, "global {}", names.iter().format(", ")),
            Stmt::Nonlocal(names) => write!(f, "nonlocal {}", names.iter().format(", ")),
            Stmt::Expr(e) => write!(f, "{}", e),
            Stmt::Assign { targets, value } => {
                write!(f, "{} = {}", targets.iter().format(" = "), value)
            }
            Stmt::AugAssign { target, op, value } => write!(f, "{} {}= {}", target, op, value),
            Stmt::AnnAssign { target, annotation, value } => match value {
                Some(value) => write!(f, "{}: {} = {}", target, annotation, value),
                None => write!(f, "{}: {}", target, annotation),
            },
            Stmt::Delete(targets) => write!(f, "del {}", targets.iter().format(", ")),
            Stmt::Import(names) => write!(f, "import {}", names.iter().format(", ")),
            Stmt::ImportFrom { module, names } => write!(
                f,
                "from {} import {}",
                module.as_deref().unwrap_or("."),
                names.iter().format(", ")
            ),
            Stmt::Assert { test, msg } => match msg {
                Some(msg) => write!(f, "assert {}, {}", test, msg),
                None => write!(f, "assert {}", test),
            },
            Stmt::Return(None) => write!(f, "return"),
            Stmt::Return(Some(value)) => write!(f, "return {}", value),
            Stmt::Raise { exc, cause } => match (exc, cause) {
                (None, _) => write!(f, "raise"),
                (Some(exc), None) => write!(f, "raise {}", exc),
                (Some(exc), Some(cause)) => write!(f, "raise {} from {}", exc, cause),
            },
            Stmt::If { test, .. } => write!(f, "if {}:", test),
            Stmt::While { test, .. } => write!(f, "while {}:", test),
            Stmt::For { target, iter, is_async, .. } => {
                if *is_async {
                    write!(f, "async ")?;
                }
                write!(f, "for {} in {}:", target, iter)
            }
            Stmt::With { items, is_async, .. } => {
                if *is_async {
                    write!(f, "async ")?;
                }
                write!(f, "with {}:", items.iter().format(", "))
            }
            Stmt::Try { .. } => write!(f, "try:"),
            Stmt::FunctionDef(fun) => {
                if fun.is_async {
                    write!(f, "async ")?;
                }
                write!(f, "def {}({}):", fun.name, fun.params.iter().format(", "))
            }
            Stmt::ClassDef(class_def) => {
                if class_def.bases.is_empty() {
                    write!(f, "class {}:", class_def.name)
                } else {
                    write!(
                        f,
                        "class {}({}):",
                        class_def.name,
                        class_def.bases.iter().format(", ")
                    )
                }
            }
        }
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.asname {
            Some(asname) => write!(f, "{} as {}", self.name, asname),
            None => write!(f, "{}", self.name),
        }
    }
}

impl Display for WithItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{} as {}", self.context, target),
            None => write!(f, "{}", self.context),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Constant(c) => write!(f, "{}", c),
            Expr::Name(name) => write!(f, "{}", name),
            Expr::Attribute { value, attr } => write!(f, "{}.{}", value, attr),
            Expr::Subscript { value, index } => write!(f, "{}[{}]", value, index),
            Expr::Call { func, args } => write!(f, "{}({})", func, args.iter().format(", ")),
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Not => write!(f, "not {}", operand),
                UnaryOp::UAdd => write!(f, "+{}", operand),
                UnaryOp::USub => write!(f, "-{}", operand),
                UnaryOp::Invert => write!(f, "~{}", operand),
            },
            Expr::BinOp { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::BoolOp { op, values } => {
                let sep = match op {
                    BoolOp::And => " and ",
                    BoolOp::Or => " or ",
                };
                write!(f, "{}", values.iter().format(sep))
            }
            Expr::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::Tuple(elts) => write!(f, "({})", elts.iter().format(", ")),
            Expr::List(elts) => write!(f, "[{}]", elts.iter().format(", ")),
            Expr::Yield(None) => write!(f, "yield"),
            Expr::Yield(Some(value)) => write!(f, "yield {}", value),
            Expr::Await(value) => write!(f, "await {}", value),
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::None => write!(f, "None"),
            Constant::Bool(true) => write!(f, "True"),
            Constant::Bool(false) => write!(f, "False"),
            Constant::Int(n) => write!(f, "{}", n),
            Constant::Float(x) => write!(f, "{}", x),
            Constant::Complex { real, imag } if *real == 0.0 => write!(f, "{}j", imag),
            Constant::Complex { real, imag } => write!(f, "({}+{}j)", real, imag),
            Constant::Str(s) => write!(f, "'{}'", s),
            Constant::Bytes(b) => write!(f, "b{:?}", String::from_utf8_lossy(b)),
            Constant::Ellipsis => write!(f, "..."),
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mult => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        };
        write!(f, "{}", symbol)
    }
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        };
        write!(f, "{}", symbol)
    }
}

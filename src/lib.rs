//! Intra-procedural control-flow analysis for a Python-style language.
//!
//! Given the already-parsed AST of a function, coroutine, module or class
//! body, the analyser produces a labelled directed graph in which every
//! reachable statement is a node and every possible transfer of control is
//! a labelled edge (`next`, `error`, `enter`, `else`). Downstream checkers
//! such as unreachable-code or redundant-return detectors work on that
//! graph alone; no linting happens here.
//!
//! ```
//! use cfa::analyse_function;
//! use cfa::ast::{FunctionDef, Stmt};
//! use cfa::graph::EdgeLabel;
//!
//! let function = FunctionDef {
//!     name: "f".to_string(),
//!     params: vec![],
//!     body: vec![Stmt::Pass],
//!     is_async: false,
//! };
//! let analysis = analyse_function(&function).unwrap();
//! let pass_node = analysis.entry_node;
//! assert_eq!(analysis.edge(pass_node, EdgeLabel::Next), analysis.leave_node);
//! ```

pub mod analyser;
pub mod analysis;
pub mod ast;
pub mod graph;
pub mod node;

pub use analyser::{analyse_class, analyse_function, analyse_module, AnalysisError};
pub use analysis::Analysis;
pub use graph::{CfGraph, EdgeLabel, Edges, GraphError, NodeIdx};
pub use node::{Annotation, AstRef, CfNode};

use log::debug;
use thiserror::Error;

use crate::analysis::Analysis;
use crate::ast::{ClassDef, ExceptHandler, Expr, FunctionDef, Module, Stmt};
use crate::graph::{CfGraph, Edges, GraphError, NodeIdx};
use crate::node::{Annotation, CfNode};

/// Failure modes of an analysis.
///
/// The statement enum is exhaustive, so there is no "unsupported statement"
/// case; what remains is malformed input the AST producer should not have
/// accepted, plus graph-invariant violations.
#[derive(PartialEq,Eq,Clone,Debug,Error)]
pub enum AnalysisError {
    /// A `break` statement with no enclosing loop.
    #[error("`break` outside a loop")]
    BreakOutsideLoop,
    /// A `continue` statement with no enclosing loop.
    #[error("`continue` outside a loop")]
    ContinueOutsideLoop,
    /// A `return` statement at module or class scope.
    #[error("`return` outside a function")]
    ReturnOutsideFunction,
    /// A graph invariant was about to be broken; this indicates a bug in
    /// the analyser itself, not in the input.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// The control-flow roles a statement can jump through.
#[derive(PartialEq,Eq,Clone,Copy,Debug)]
enum Role {
    /// Where an uncaught exception goes.
    Raise,
    /// Where `return` without a value, or falling off the end, goes.
    Leave,
    /// Where `return <expr>` goes.
    Return,
    /// Where `break` goes.
    Break,
    /// Where `continue` goes.
    Continue,
}

const ROLES: [Role; 5] = [Role::Raise, Role::Leave, Role::Return, Role::Break, Role::Continue];

/// The exit targets in effect while a sub-tree is analysed.
///
/// The raise target is always set; the leave and return targets only inside
/// a function, break and continue only inside a loop body. The context is
/// small and `Copy`, so scoped updates are a save of the whole struct on
/// entry and an assignment back on exit.
#[derive(Clone,Copy,Debug)]
struct Context {
    raise_target: NodeIdx,
    leave_target: Option<NodeIdx>,
    return_target: Option<NodeIdx>,
    break_target: Option<NodeIdx>,
    continue_target: Option<NodeIdx>,
}

impl Context {
    fn get(&self, role: Role) -> Option<NodeIdx> {
        match role {
            Role::Raise => Some(self.raise_target),
            Role::Leave => self.leave_target,
            Role::Return => self.return_target,
            Role::Break => self.break_target,
            Role::Continue => self.continue_target,
        }
    }

    fn set(&mut self, role: Role, target: NodeIdx) {
        match role {
            Role::Raise => self.raise_target = target,
            Role::Leave => self.leave_target = Some(target),
            Role::Return => self.return_target = Some(target),
            Role::Break => self.break_target = Some(target),
            Role::Continue => self.continue_target = Some(target),
        }
    }
}

//////////////////
// Entry points //
//////////////////

/// Construct the control-flow graph of a function or coroutine body.
pub fn analyse_function(function: &FunctionDef) -> Result<Analysis<'_>, AnalysisError> {
    debug!(
        "analysing {} `{}`",
        if function.is_async { "coroutine" } else { "function" },
        function.name
    );
    analyse_unit(&function.body, true)
}

/// Construct the control-flow graph of a module body.
///
/// There is no return target at module scope: a `return` statement in the
/// body is reported as [`AnalysisError::ReturnOutsideFunction`].
pub fn analyse_module(module: &Module) -> Result<Analysis<'_>, AnalysisError> {
    debug!("analysing module of {} top-level statements", module.body.len());
    analyse_unit(&module.body, false)
}

/// Construct the control-flow graph of a class body. Class bodies behave
/// exactly like module bodies.
pub fn analyse_class(class_def: &ClassDef) -> Result<Analysis<'_>, AnalysisError> {
    debug!("analysing class `{}`", class_def.name);
    analyse_unit(&class_def.body, false)
}

/// Shared implementation of the three entry points. Each call builds a
/// fresh analyser and consumes it, so an analyser can never be reused.
fn analyse_unit(body: &[Stmt], function_scope: bool) -> Result<Analysis<'_>, AnalysisError> {
    let mut graph = CfGraph::new();
    let leave_node = graph.add_node(CfNode::annotated(Annotation::Leave), Edges::new())?;
    let raise_node = graph.add_node(CfNode::annotated(Annotation::Raise), Edges::new())?;
    let return_node = if function_scope {
        Some(graph.add_node(CfNode::annotated(Annotation::Return), Edges::new())?)
    } else {
        None
    };

    let mut analyser = Analyser {
        graph,
        context: Context {
            raise_target: raise_node,
            leave_target: if function_scope { Some(leave_node) } else { None },
            return_target: return_node,
            break_target: None,
            continue_target: None,
        },
    };
    let entry_node = analyser.analyse_statements(body, leave_node)?;

    // Guarantee at least one reference to the entry node.
    analyser
        .graph
        .add_node(CfNode::annotated(Annotation::Start), Edges::new().enter(entry_node))?;

    let leave_node = analyser.prune_unreached(leave_node)?;
    let raise_node = analyser.prune_unreached(raise_node)?;
    let return_node = match return_node {
        Some(node) => analyser.prune_unreached(node)?,
        None => None,
    };

    Ok(Analysis::new(analyser.graph, entry_node, leave_node, raise_node, return_node))
}

//////////////////
// The analyser //
//////////////////

/// Recursive AST walker building the control-flow graph.
///
/// Statement sequences are analysed right-to-left: each statement is given
/// the entry node of its successor as `next` and returns its own entry
/// node, so every node is emitted already wired to its true successors.
struct Analyser<'a> {
    graph: CfGraph<CfNode<'a>>,
    context: Context,
}

impl<'a> Analyser<'a> {
    // Graph building helpers.

    /// Add a node wrapping a statement, with the given edges.
    fn stmt_node(&mut self, statement: &'a Stmt, edges: Edges) -> Result<NodeIdx, AnalysisError> {
        Ok(self.graph.add_node(CfNode::stmt(statement), edges)?)
    }

    /// Add a node wrapping an `except` clause's type expression.
    fn expr_node(&mut self, expr: &'a Expr, edges: Edges) -> Result<NodeIdx, AnalysisError> {
        Ok(self.graph.add_node(CfNode::expr(expr), edges)?)
    }

    /// Add a placeholder node, to be collapsed or removed later.
    fn dummy_node(&mut self) -> Result<NodeIdx, AnalysisError> {
        Ok(self.graph.add_node(CfNode::dummy(), Edges::new())?)
    }

    /// Keep a synthetic terminal node only if something points at it.
    fn prune_unreached(&mut self, node: NodeIdx) -> Result<Option<NodeIdx>, AnalysisError> {
        if self.graph.predecessors(node).is_some() {
            Ok(Some(node))
        } else {
            self.graph.remove_node(node)?;
            Ok(None)
        }
    }

    // Statement analysis.

    /// Analyse a sequence of statements, wiring the last one to `next`.
    /// Returns the entry node of the sequence (`next` itself if empty).
    fn analyse_statements(
        &mut self,
        statements: &'a [Stmt],
        next: NodeIdx,
    ) -> Result<NodeIdx, AnalysisError> {
        let mut next = next;
        for statement in statements.iter().rev() {
            next = self.analyse_statement(statement, next)?;
        }
        Ok(next)
    }

    fn analyse_statement(
        &mut self,
        statement: &'a Stmt,
        next: NodeIdx,
    ) -> Result<NodeIdx, AnalysisError> {
        match statement {
            // Statements that cannot raise.
            Stmt::Pass | Stmt::Global(_) | Stmt::Nonlocal(_) => {
                self.stmt_node(statement, Edges::new().next(next))
            }

            // Generic side-effecting statements. Definitions belong here
            // too: at the enclosing scope a `def` or `class` only binds a
            // name, and the body is not walked as part of this unit.
            Stmt::Expr(_)
            | Stmt::Assign { .. }
            | Stmt::AugAssign { .. }
            | Stmt::AnnAssign { .. }
            | Stmt::Delete(_)
            | Stmt::Import(_)
            | Stmt::ImportFrom { .. }
            | Stmt::FunctionDef(_)
            | Stmt::ClassDef(_) => self.stmt_node(
                statement,
                Edges::new().next(next).error(self.context.raise_target),
            ),

            Stmt::Break => {
                let target = self.context.break_target.ok_or(AnalysisError::BreakOutsideLoop)?;
                self.stmt_node(statement, Edges::new().next(target))
            }

            Stmt::Continue => {
                let target = self
                    .context
                    .continue_target
                    .ok_or(AnalysisError::ContinueOutsideLoop)?;
                self.stmt_node(statement, Edges::new().next(target))
            }

            Stmt::Return(value) => self.analyse_return(statement, value.as_ref()),

            Stmt::Raise { .. } => {
                self.stmt_node(statement, Edges::new().error(self.context.raise_target))
            }

            Stmt::Assert { test, .. } => {
                // If the test is a truthy constant the assert cannot fail
                // and the message is never evaluated, so no error path.
                let edges = match test.as_constant() {
                    Some(c) if c.truthy() => Edges::new().next(next),
                    Some(_) => Edges::new().error(self.context.raise_target),
                    None => Edges::new().next(next).error(self.context.raise_target),
                };
                self.stmt_node(statement, edges)
            }

            Stmt::If { test, body, orelse } => {
                // Analyse both branches unconditionally: even when one is
                // known dead its statements must still appear in the graph.
                let body_node = self.analyse_statements(body, next)?;
                let else_node = self.analyse_statements(orelse, next)?;
                let edges = match test.as_constant() {
                    Some(c) if c.truthy() => Edges::new().enter(body_node),
                    Some(_) => Edges::new().else_(else_node),
                    None => Edges::new()
                        .enter(body_node)
                        .else_(else_node)
                        .error(self.context.raise_target),
                };
                self.stmt_node(statement, edges)
            }

            Stmt::While { test, body, orelse } => {
                self.analyse_loop(statement, Some(test), body, orelse, next)
            }

            Stmt::For { body, orelse, .. } => {
                self.analyse_loop(statement, None, body, orelse, next)
            }

            Stmt::With { body, .. } => {
                let body_node = self.analyse_statements(body, next)?;
                self.stmt_node(
                    statement,
                    Edges::new().enter(body_node).error(self.context.raise_target),
                )
            }

            Stmt::Try { body, handlers, orelse, finalbody } => {
                self.analyse_try(statement, body, handlers, orelse, finalbody, next)
            }
        }
    }

    fn analyse_return(
        &mut self,
        statement: &'a Stmt,
        value: Option<&'a Expr>,
    ) -> Result<NodeIdx, AnalysisError> {
        match value {
            None => {
                let target = self
                    .context
                    .leave_target
                    .ok_or(AnalysisError::ReturnOutsideFunction)?;
                self.stmt_node(statement, Edges::new().next(target))
            }
            Some(_) => {
                // The returned expression is treated as able to raise even
                // when it is a literal: constants are only folded in
                // `if`/`while`/`assert` conditions.
                let target = self
                    .context
                    .return_target
                    .ok_or(AnalysisError::ReturnOutsideFunction)?;
                self.stmt_node(
                    statement,
                    Edges::new().next(target).error(self.context.raise_target),
                )
            }
        }
    }

    /// Analyse a `while`, `for` or `async for` statement. `test` is the
    /// loop condition for `while`; a `for` loop has none.
    fn analyse_loop(
        &mut self,
        statement: &'a Stmt,
        test: Option<&Expr>,
        body: &'a [Stmt],
        orelse: &'a [Stmt],
        next: NodeIdx,
    ) -> Result<NodeIdx, AnalysisError> {
        // Target for the next iteration; identified with the loop node once
        // that exists.
        let dummy = self.dummy_node()?;

        let saved = self.context;
        self.context.break_target = Some(next);
        self.context.continue_target = Some(dummy);
        let body_node = self.analyse_statements(body, dummy)?;
        self.context = saved;

        let else_node = self.analyse_statements(orelse, next)?;

        let edges = match test.and_then(Expr::as_constant) {
            Some(c) if c.truthy() => Edges::new().enter(body_node),
            Some(_) => Edges::new().else_(else_node),
            None => Edges::new()
                .enter(body_node)
                .else_(else_node)
                .error(self.context.raise_target),
        };
        let loop_node = self.stmt_node(statement, edges)?;

        // Close the loop: in-body continues and the body fall-through were
        // wired to the dummy and now come back to the loop node itself.
        self.graph.collapse_node(dummy, loop_node)?;
        Ok(loop_node)
    }

    /// Analyse a complete `try` statement. `try-except-else-finally` is
    /// treated as a `try-except-else` nested inside a `try-finally`.
    ///
    /// The finally block can be entered for up to six reasons (fall
    /// through, raise, return with or without value, break, continue), and
    /// on leaving it control continues somewhere different for each. One
    /// copy of the finally body is analysed per distinct onward target that
    /// is actually reached, plus the fall-through copy which is always
    /// analysed even when unreachable.
    fn analyse_try(
        &mut self,
        statement: &'a Stmt,
        body: &'a [Stmt],
        handlers: &'a [ExceptHandler],
        orelse: &'a [Stmt],
        finalbody: &'a [Stmt],
        next: NodeIdx,
    ) -> Result<NodeIdx, AnalysisError> {
        // The fall-through copy of the finally block.
        let finally_entry = self.analyse_statements(finalbody, next)?;

        // Reroute every context role through a dummy node, one per distinct
        // target; roles already aimed at `next` go straight to the
        // fall-through copy.
        let saved = self.context;
        let mut dummies: Vec<(NodeIdx, NodeIdx)> = Vec::new();
        for role in ROLES.iter().copied() {
            if let Some(end) = saved.get(role) {
                if end == next {
                    self.context.set(role, finally_entry);
                } else {
                    let dummy = match dummies.iter().find(|(e, _)| *e == end) {
                        Some(&(_, dummy)) => dummy,
                        None => {
                            let dummy = self.dummy_node()?;
                            dummies.push((end, dummy));
                            dummy
                        }
                    };
                    self.context.set(role, dummy);
                }
            }
        }

        let entry_node = self.analyse_try_except(statement, body, handlers, orelse, finally_entry)?;
        self.context = saved;

        // Each reached dummy becomes its own copy of the finally block,
        // wired to the original onward target; unreached dummies are
        // dropped without analysing a copy for them.
        for (end, dummy) in dummies {
            if self.graph.predecessors(dummy).is_some() {
                let finally_copy = self.analyse_statements(finalbody, end)?;
                self.graph.collapse_node(dummy, finally_copy)?;
            } else {
                self.graph.remove_node(dummy)?;
            }
        }

        Ok(entry_node)
    }

    /// Analyse the `try-except-else` part of a `try` statement, as though
    /// no finally block were present.
    fn analyse_try_except(
        &mut self,
        statement: &'a Stmt,
        body: &'a [Stmt],
        handlers: &'a [ExceptHandler],
        orelse: &'a [Stmt],
        next: NodeIdx,
    ) -> Result<NodeIdx, AnalysisError> {
        // Walk handlers in reverse; the "no handler matched" sink starts as
        // the surrounding raise target.
        let mut raise_node = self.context.raise_target;
        for handler in handlers.iter().rev() {
            let match_node = self.analyse_statements(&handler.body, next)?;
            raise_node = match &handler.typ {
                // A bare `except` always matches and never misses.
                None => match_node,
                Some(typ) => self.expr_node(
                    typ,
                    Edges::new()
                        .enter(match_node)
                        .else_(raise_node)
                        .error(self.context.raise_target),
                )?,
            };
        }

        let else_node = self.analyse_statements(orelse, next)?;

        let saved = self.context;
        self.context.raise_target = raise_node;
        let body_node = self.analyse_statements(body, else_node)?;
        self.context = saved;

        self.stmt_node(statement, Edges::new().next(body_node))
    }
}

//! Semantic analysis: declaration and type checking over the syntax tree.
//!
//! The analyzer never aborts: it walks the whole tree once, left to right,
//! and accumulates every violation it finds, so the reported sequence is in
//! source order and a single run shows all problems.
mod symbol_table;

pub use symbol_table::{Redeclared, Slot, Symbol, SymbolTable};

use crate::ast::{BinaryOp, Block, Expr, Program, Statement, Type};
use crate::error::Span;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticErrorKind {
    #[error("variable '{0}' already declared")]
    Redeclared(String),
    #[error("unknown variable '{0}'")]
    Undeclared(String),
    #[error("cannot assign a {value} value to '{name}' of type {target}")]
    AssignMismatch {
        name: String,
        target: Type,
        value: Type,
    },
    #[error("condition must be boolean, found {0}")]
    ConditionNotBoolean(Type),
    #[error("relational operator cannot compare {lhs} and {rhs}")]
    CompareMismatch { lhs: Type, rhs: Type },
    #[error("arithmetic operator requires int operands, found {0}")]
    ArithmeticMismatch(Type),
}

/// A recorded violation plus the source range it points at. Rendering with
/// line/column happens at report time through [`crate::error::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub span: Span,
}

/// Runs the full pass over `program` with a fresh symbol table and returns
/// every error found, in source order. An empty vector means the tree is
/// safe to hand to code generation.
pub fn analyze(program: &Program) -> Vec<SemanticError> {
    let mut analyzer = Analyzer::default();
    analyzer.program(program);
    analyzer.errors
}

#[derive(Default)]
struct Analyzer<'source> {
    table: SymbolTable<'source>,
    errors: Vec<SemanticError>,
}

impl<'source> Analyzer<'source> {
    fn program(&mut self, Program(statements): &Program<'source>) {
        self.table.enter_scope();
        for (statement, _) in statements {
            self.statement(statement);
        }
        self.table.exit_scope();
        tracing::debug!(
            target: "semantic",
            "analysis finished with {} error(s)",
            self.errors.len()
        );
    }

    fn block(&mut self, block: &Block<'source>) {
        self.table.enter_scope();
        for (statement, _) in &block.statements {
            self.statement(statement);
        }
        self.table.exit_scope();
    }

    fn statement(&mut self, statement: &Statement<'source>) {
        match statement {
            Statement::Declare { ty, name } => {
                if self.table.declare(name.source, *ty).is_err() {
                    self.report(SemanticErrorKind::Redeclared(name.source.to_string()), name.span);
                } else {
                    tracing::trace!(target: "semantic::declare", "{}: {}", name.source, ty);
                }
            }
            Statement::Assign { target, value } => {
                let target_ty = match self.table.resolve(target.source) {
                    Some(symbol) => Some(symbol.ty),
                    None => {
                        self.report(
                            SemanticErrorKind::Undeclared(target.source.to_string()),
                            target.span,
                        );
                        None
                    }
                };
                let value_ty = self.expr(&value.0, value.1);
                if let (Some(target_ty), Some(value_ty)) = (target_ty, value_ty) {
                    if target_ty != value_ty {
                        self.report(
                            SemanticErrorKind::AssignMismatch {
                                name: target.source.to_string(),
                                target: target_ty,
                                value: value_ty,
                            },
                            value.1,
                        );
                    }
                }
            }
            Statement::If {
                condition,
                true_branch,
                false_branch,
            } => {
                if let Some(ty) = self.expr(&condition.0, condition.1) {
                    if ty != Type::Bool {
                        self.report(SemanticErrorKind::ConditionNotBoolean(ty), condition.1);
                    }
                }
                self.block(true_branch);
                if let Some(false_branch) = false_branch {
                    self.block(false_branch);
                }
            }
            Statement::Print { .. } => {}
        }
    }

    /// Bottom-up type inference. `None` is the unknown bottom type: it is
    /// produced by unresolved names and suppresses any mismatch check it
    /// takes part in, so one undeclared variable reports exactly once.
    fn expr(&mut self, expr: &Expr<'source>, span: Span) -> Option<Type> {
        match expr {
            Expr::Constant(_) => Some(Type::Int),
            Expr::Variable { name } => match self.table.resolve(name.source) {
                Some(symbol) => Some(symbol.ty),
                None => {
                    self.report(
                        SemanticErrorKind::Undeclared(name.source.to_string()),
                        name.span,
                    );
                    None
                }
            },
            Expr::Binary { operator, lhs, rhs } => {
                let lhs_ty = self.expr(&lhs.0, lhs.1);
                let rhs_ty = self.expr(&rhs.0, rhs.1);
                match operator {
                    BinaryOp::Relational(_) => {
                        if let (Some(lhs_ty), Some(rhs_ty)) = (lhs_ty, rhs_ty) {
                            if lhs_ty != rhs_ty {
                                self.report(
                                    SemanticErrorKind::CompareMismatch {
                                        lhs: lhs_ty,
                                        rhs: rhs_ty,
                                    },
                                    span,
                                );
                            }
                        }
                        Some(Type::Bool)
                    }
                    BinaryOp::Arithmetic(_) => {
                        if let Some(bad) = [lhs_ty, rhs_ty]
                            .into_iter()
                            .flatten()
                            .find(|ty| *ty != Type::Int)
                        {
                            self.report(SemanticErrorKind::ArithmeticMismatch(bad), span);
                        }
                        Some(Type::Int)
                    }
                }
            }
        }
    }

    fn report(&mut self, kind: SemanticErrorKind, span: Span) {
        tracing::trace!(target: "semantic::error", "{} at {:?}", kind, span);
        self.errors.push(SemanticError { kind, span });
    }
}

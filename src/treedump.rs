//! Serialises the syntax tree as nested `{"node": ..., "children": [...]}`
//! objects, with token lexemes as plain leaf strings. This is the dump the
//! driver writes next to the generated IR; nothing in the pipeline reads
//! it back.
use serde_json::{json, Value};

use crate::ast::{Block, Expr, Program, Statement};

pub fn program_to_json(Program(statements): &Program) -> Value {
    node(
        "Program",
        statements.iter().map(|(stmt, _)| statement_to_json(stmt)),
    )
}

fn block_to_json(block: &Block) -> Value {
    node(
        "Block",
        block.statements.iter().map(|(stmt, _)| statement_to_json(stmt)),
    )
}

fn statement_to_json(statement: &Statement) -> Value {
    match statement {
        Statement::Declare { ty, name } => node(
            "VarDecl",
            [json!(ty.keyword()), json!(name.source)],
        ),
        Statement::Assign { target, value } => node(
            "Assign",
            [
                node("Identifier", [json!(target.source)]),
                json!("="),
                expr_to_json(&value.0),
            ],
        ),
        Statement::If {
            condition,
            true_branch,
            false_branch,
        } => {
            let mut children = vec![expr_to_json(&condition.0), block_to_json(true_branch)];
            if let Some(false_branch) = false_branch {
                children.push(block_to_json(false_branch));
            }
            node("If", children)
        }
        Statement::Print { message } => node("Print", [json!(message.source)]),
    }
}

fn expr_to_json(expr: &Expr) -> Value {
    match expr {
        Expr::Variable { name } => node("Identifier", [json!(name.source)]),
        Expr::Constant(constant) => node("IntLiteral", [json!(constant.to_string())]),
        Expr::Binary { operator, lhs, rhs } => node(
            "BinaryExpr",
            [
                expr_to_json(&lhs.0),
                json!(operator.lexeme()),
                expr_to_json(&rhs.0),
            ],
        ),
    }
}

fn node(kind: &str, children: impl IntoIterator<Item = Value>) -> Value {
    json!({
        "node": kind,
        "children": children.into_iter().collect::<Vec<_>>(),
    })
}

use super::{expr, CodegenError, Emitter};
use crate::ast::{Block, Statement};
use crate::ir::Instruction;

pub fn emit_statement<'source>(
    state: &mut Emitter<'source>,
    statement: &Statement<'source>,
) -> Result<(), CodegenError> {
    match statement {
        Statement::Declare { ty, name } => {
            let slot = state.declare(name.source, *ty);
            tracing::trace!(target: "irgen::statement", "alloc {} for {}", slot, name.source);
            state.push(Instruction::Alloc { slot, ty: *ty });
            Ok(())
        }
        Statement::Assign { target, value } => {
            // evaluate the right-hand side first, then store into the target
            let (value, _) = expr::emit_expr(state, &value.0)?;
            let (slot, ty) = state
                .resolve(target.source)
                .ok_or_else(|| CodegenError::UnresolvedVariable(target.source.to_string()))?;
            state.push(Instruction::Store { slot, ty, value });
            Ok(())
        }
        Statement::If {
            condition,
            true_branch,
            false_branch,
        } => {
            let (flag, _) = expr::emit_expr(state, &condition.0)?;
            let (then_label, else_label, end_label) = state.next_branch();
            state.push(Instruction::CondBranch {
                flag,
                target_true: then_label,
                target_false: else_label,
            });

            state.push(Instruction::Label(then_label));
            emit_block(state, true_branch)?;
            state.push(Instruction::Branch { target: end_label });

            // the else label exists even without an else branch, so both
            // arms of the conditional branch land on defined positions
            state.push(Instruction::Label(else_label));
            if let Some(false_branch) = false_branch {
                emit_block(state, false_branch)?;
            }
            state.push(Instruction::Branch { target: end_label });

            state.push(Instruction::Label(end_label));
            Ok(())
        }
        Statement::Print { message } => {
            state.push(Instruction::PrintConst {
                message: message.source.to_string(),
            });
            Ok(())
        }
    }
}

fn emit_block<'source>(
    state: &mut Emitter<'source>,
    block: &Block<'source>,
) -> Result<(), CodegenError> {
    state.enter_scope();
    for (statement, _) in &block.statements {
        emit_statement(state, statement)?;
    }
    state.exit_scope();
    Ok(())
}

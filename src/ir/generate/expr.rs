use super::{CodegenError, Emitter};
use crate::ast::{BinaryOp, Expr, Type};
use crate::ir::{Instruction, Operand};

/// Emits the instructions that evaluate `expr` and hands back the operand
/// holding its result, together with the expression's type. Constants stay
/// immediates; everything else lands in a fresh temp.
pub fn emit_expr<'source>(
    state: &mut Emitter<'source>,
    expr: &Expr<'source>,
) -> Result<(Operand, Type), CodegenError> {
    match expr {
        Expr::Constant(constant) => Ok((Operand::Constant(*constant), Type::Int)),
        Expr::Variable { name } => {
            let (slot, ty) = state
                .resolve(name.source)
                .ok_or_else(|| CodegenError::UnresolvedVariable(name.source.to_string()))?;
            let target = state.next_temp();
            state.push(Instruction::Load { target, slot, ty });
            Ok((target.into(), ty))
        }
        Expr::Binary { operator, lhs, rhs } => {
            let (lhs, lhs_ty) = emit_expr(state, &lhs.0)?;
            let (rhs, _) = emit_expr(state, &rhs.0)?;
            let target = state.next_temp();
            match operator {
                BinaryOp::Arithmetic(op) => {
                    state.push(Instruction::Arith {
                        target,
                        op: (*op).into(),
                        lhs,
                        rhs,
                    });
                    Ok((target.into(), Type::Int))
                }
                BinaryOp::Relational(relational) => {
                    state.push(Instruction::Cmp {
                        target,
                        condition: relational.to_condition(),
                        ty: lhs_ty,
                        lhs,
                        rhs,
                    });
                    Ok((target.into(), Type::Bool))
                }
            }
        }
    }
}

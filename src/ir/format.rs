use std::fmt;

use super::{ArithOp, Instruction, Label, LabelKind, Operand, Slot, Temp};
use crate::ast::Type;

// format impls: every instruction renders as exactly one line of text

impl fmt::Display for Temp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%t{}", self.0)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version == 0 {
            write!(f, "%{}", self.name)
        } else {
            write!(f, "%{}.{}", self.name, self.version)
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stem = match self.kind {
            LabelKind::Then => "then",
            LabelKind::Else => "else",
            LabelKind::End => "end",
        };
        write!(f, "{}{}", stem, self.branch)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temp(temp) => temp.fmt(f),
            Self::Constant(constant) => constant.fmt(f),
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Subtract => "sub",
            Self::Multiply => "mul",
            Self::Divide => "sdiv",
        })
    }
}

const fn llvm_type(ty: Type) -> &'static str {
    match ty {
        Type::Int => "i32",
        Type::Bool => "i1",
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc { slot, ty } => write!(f, "{} = alloca {}", slot, llvm_type(*ty)),
            Self::Store { slot, ty, value } => {
                let ty = llvm_type(*ty);
                write!(f, "store {} {}, {}* {}", ty, value, ty, slot)
            }
            Self::Load { target, slot, ty } => {
                let ty = llvm_type(*ty);
                write!(f, "{} = load {}, {}* {}", target, ty, ty, slot)
            }
            Self::Arith {
                target,
                op,
                lhs,
                rhs,
            } => write!(f, "{} = {} i32 {}, {}", target, op, lhs, rhs),
            Self::Cmp {
                target,
                condition,
                ty,
                lhs,
                rhs,
            } => write!(
                f,
                "{} = icmp {} {} {}, {}",
                target,
                condition.icmp_code(),
                llvm_type(*ty),
                lhs,
                rhs
            ),
            Self::CondBranch {
                flag,
                target_true,
                target_false,
            } => write!(
                f,
                "br i1 {}, label %{}, label %{}",
                flag, target_true, target_false
            ),
            Self::Branch { target } => write!(f, "br label %{}", target),
            Self::Label(label) => write!(f, "{}:", label),
            Self::PrintConst { message } => write!(f, "call void @print(\"{}\")", message),
            Self::Return => f.write_str("ret void"),
        }
    }
}

//! Lowering of a checked syntax tree into the flat instruction sequence.
//!
//! Code generation runs only when every earlier stage finished clean; the
//! entry point enforces that itself instead of trusting the caller.
use std::collections::HashMap;

use super::{IRCode, Instruction, Label, LabelKind, Slot, Temp};
use crate::ast::{Program, Type};
use thiserror::Error;

mod expr;
mod statement;

#[derive(Error, Debug)]
pub enum CodegenError {
    /// The all-or-nothing gate: emitting IR for a program that still has
    /// lexical, syntactic or semantic errors has no defined meaning.
    #[error("code generation requested with {0} outstanding error(s)")]
    OutstandingErrors(usize),
    /// A name reached lowering without a reachable declaration. Cannot
    /// happen for a tree that passed semantic analysis.
    #[error("unknown variable '{0}' survived semantic analysis")]
    UnresolvedVariable(String),
}

/// Lowers `program`, refusing to run while any earlier stage still has
/// errors outstanding. On success the returned sequence is the whole
/// emitted program, in order.
pub fn generate_program(
    program: &Program,
    outstanding_errors: usize,
) -> Result<IRCode, CodegenError> {
    if outstanding_errors != 0 {
        return Err(CodegenError::OutstandingErrors(outstanding_errors));
    }
    let Program(statements) = program;
    let mut state = Emitter::default();
    state.enter_scope();
    for (stmt, _) in statements {
        statement::emit_statement(&mut state, stmt)?;
    }
    state.exit_scope();
    state.push(Instruction::Return);
    tracing::debug!(target: "irgen", "emitted {} instruction(s)", state.code.len());
    Ok(state.release())
}

/// All the per-pass emission state: the growing instruction sequence, the
/// fresh-name counters and the variable scopes. One of these exists per
/// [`generate_program`] call, so independent compilations never share
/// counters.
#[derive(Default)]
pub struct Emitter<'source> {
    code: IRCode,
    temps: TempCounter,
    branches: BranchCounter,
    scopes: Vec<HashMap<&'source str, (Slot, Type)>>,
    allocations: HashMap<&'source str, usize>,
}

#[derive(Default)]
struct TempCounter {
    latest: usize,
}

impl TempCounter {
    fn next_temp(&mut self) -> Temp {
        let current = self.latest;
        self.latest += 1;
        Temp(current)
    }
}

#[derive(Default)]
struct BranchCounter {
    latest: usize,
}

impl BranchCounter {
    /// Three fresh, pairwise-distinct labels for one two-way branch.
    fn next_branch(&mut self) -> (Label, Label, Label) {
        let branch = self.latest;
        self.latest += 1;
        (
            Label {
                kind: LabelKind::Then,
                branch,
            },
            Label {
                kind: LabelKind::Else,
                branch,
            },
            Label {
                kind: LabelKind::End,
                branch,
            },
        )
    }
}

impl<'source> Emitter<'source> {
    pub fn push(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    pub fn next_temp(&mut self) -> Temp {
        self.temps.next_temp()
    }

    pub fn next_branch(&mut self) -> (Label, Label, Label) {
        self.branches.next_branch()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        self.scopes
            .pop()
            .expect("scope underflow during code generation");
    }

    /// Binds `name` in the innermost scope to a fresh slot. Re-allocating a
    /// name the pass has already seen (a shadowing declaration in another
    /// scope) bumps the slot version so storage names stay unique.
    pub fn declare(&mut self, name: &'source str, ty: Type) -> Slot {
        let version = self.allocations.entry(name).or_insert(0);
        let slot = Slot {
            name: name.to_string(),
            version: *version,
        };
        *version += 1;
        self.scopes
            .last_mut()
            .expect("declare called with no open scope")
            .insert(name, (slot.clone(), ty));
        slot
    }

    /// Innermost-to-outermost lookup of a variable's storage and type.
    pub fn resolve(&self, name: &str) -> Option<(Slot, Type)> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    fn release(self) -> IRCode {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;
    use crate::error::SourceMetadata;
    use crate::grammar::Parser;
    use crate::ir::{ArithOp, Condition, Operand};
    use crate::semantic;

    fn lower(meta: &SourceMetadata) -> IRCode {
        let program: Program = Parser::new(meta).parse().expect("parse failed");
        let errors = semantic::analyze(&program);
        assert_eq!(errors, vec![], "test source must be semantically clean");
        generate_program(&program, errors.len()).expect("codegen failed")
    }

    #[test]
    fn gate_refuses_outstanding_errors() {
        let meta = SourceMetadata::new("I x; x = 1;");
        let program: Program = Parser::new(&meta).parse().unwrap();
        let result = generate_program(&program, 2);
        assert!(matches!(result, Err(CodegenError::OutstandingErrors(2))));
    }

    #[test]
    fn undeclared_variable_blocks_codegen() {
        let meta = SourceMetadata::new("I x; x = x + semNome;");
        let program: Program = Parser::new(&meta).parse().unwrap();
        let errors = semantic::analyze(&program);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            generate_program(&program, errors.len()),
            Err(CodegenError::OutstandingErrors(1))
        ));
    }

    #[test]
    fn sample_program_lowers_to_the_expected_diamond() {
        let meta = SourceMetadata::new(
            r#"
            I idade;
            idade = 17;
            Au (idade >= 18) {
                P("Maior de idade");
            } Cu {
                P("Menor de idade");
            }
            "#,
        );
        let idade = Slot {
            name: "idade".to_string(),
            version: 0,
        };
        let (then0, else0, end0) = (
            Label {
                kind: LabelKind::Then,
                branch: 0,
            },
            Label {
                kind: LabelKind::Else,
                branch: 0,
            },
            Label {
                kind: LabelKind::End,
                branch: 0,
            },
        );
        assert_eq!(
            lower(&meta),
            vec![
                Instruction::Alloc {
                    slot: idade.clone(),
                    ty: Type::Int
                },
                Instruction::Store {
                    slot: idade.clone(),
                    ty: Type::Int,
                    value: Operand::Constant(17)
                },
                Instruction::Load {
                    target: Temp(0),
                    slot: idade,
                    ty: Type::Int
                },
                Instruction::Cmp {
                    target: Temp(1),
                    condition: Condition::GreaterEqual,
                    ty: Type::Int,
                    lhs: Operand::Temp(Temp(0)),
                    rhs: Operand::Constant(18)
                },
                Instruction::CondBranch {
                    flag: Operand::Temp(Temp(1)),
                    target_true: then0,
                    target_false: else0
                },
                Instruction::Label(then0),
                Instruction::PrintConst {
                    message: "Maior de idade".to_string()
                },
                Instruction::Branch { target: end0 },
                Instruction::Label(else0),
                Instruction::PrintConst {
                    message: "Menor de idade".to_string()
                },
                Instruction::Branch { target: end0 },
                Instruction::Label(end0),
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn literal_assignment_stays_an_immediate() {
        let meta = SourceMetadata::new("I x; x = 17;");
        let code = lower(&meta);
        assert_eq!(code.len(), 3); // alloc, store, ret
        assert!(matches!(
            &code[1],
            Instruction::Store {
                value: Operand::Constant(17),
                ..
            }
        ));
    }

    #[test]
    fn else_less_if_still_emits_both_arm_labels() {
        let meta = SourceMetadata::new(r#"I x; x = 1; Au (x < 2) { P("ok"); }"#);
        let code = lower(&meta);
        let labels: Vec<_> = code
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Label(label) => Some(*label),
                _ => None,
            })
            .collect();
        assert_eq!(
            labels,
            vec![
                Label {
                    kind: LabelKind::Then,
                    branch: 0
                },
                Label {
                    kind: LabelKind::Else,
                    branch: 0
                },
                Label {
                    kind: LabelKind::End,
                    branch: 0
                },
            ]
        );
        // the empty else arm is just its label and the jump to end
        let else_position = code
            .iter()
            .position(|i| matches!(i, Instruction::Label(l) if l.kind == LabelKind::Else))
            .unwrap();
        assert!(matches!(
            code[else_position + 1],
            Instruction::Branch { target } if target.kind == LabelKind::End
        ));
    }

    #[test]
    fn sibling_ifs_get_distinct_labels() {
        let meta = SourceMetadata::new(
            r#"
            I x;
            x = 1;
            Au (x < 2) { P("a"); }
            Au (x < 3) { P("b"); }
            "#,
        );
        let code = lower(&meta);
        let branches: Vec<_> = code
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Label(label) => Some(label.branch),
                _ => None,
            })
            .collect();
        assert_eq!(branches, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn shadowing_declarations_get_versioned_slots() {
        let meta = SourceMetadata::new(
            r#"
            I x;
            x = 1;
            Au (x < 2) {
                I x;
                x = 5;
            }
            "#,
        );
        let code = lower(&meta);
        let slots: Vec<_> = code
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Alloc { slot, .. } => Some(slot.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].version, 0);
        assert_eq!(slots[1].version, 1);
        // the inner store goes to the shadowing slot
        let inner_store = code
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Store { slot, .. } => Some(slot.clone()),
                _ => None,
            })
            .last()
            .unwrap();
        assert_eq!(inner_store, slots[1]);
    }

    #[test]
    fn nested_expression_evaluates_operands_left_to_right() {
        let meta = SourceMetadata::new("I a; I b; a = 1; b = 2; a = a + b * 3;");
        let code = lower(&meta);
        let arith: Vec<_> = code
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Arith { op, .. } => Some(*op),
                _ => None,
            })
            .collect();
        // multiplication feeds the addition
        assert_eq!(arith, vec![ArithOp::Multiply, ArithOp::Add]);
    }

    #[test]
    fn rendering_is_one_line_per_instruction() {
        let meta = SourceMetadata::new(
            r#"
            I idade;
            idade = 17;
            Au (idade >= 18) {
                P("Maior de idade");
            } Cu {
                P("Menor de idade");
            }
            "#,
        );
        let rendered: Vec<String> = lower(&meta)
            .iter()
            .map(|instruction| instruction.to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "%idade = alloca i32",
                "store i32 17, i32* %idade",
                "%t0 = load i32, i32* %idade",
                "%t1 = icmp sge i32 %t0, 18",
                "br i1 %t1, label %then0, label %else0",
                "then0:",
                "call void @print(\"Maior de idade\")",
                "br label %end0",
                "else0:",
                "call void @print(\"Menor de idade\")",
                "br label %end0",
                "end0:",
                "ret void",
            ]
        );
        assert!(rendered.iter().all(|line| !line.contains('\n')));
    }
}

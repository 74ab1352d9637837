//! Lowers the syntax tree to bytecode in one pass.
//!
//! Variables live in numbered slots handed out on first sight. Forward jumps
//! are emitted with a placeholder target, their address is kept on the Rust
//! stack, and they are patched exactly once when the target is known.
//!
//! ``` text
//! for i = 1 to 3 { print i; }
//!
//! 0: PUSH 1           start
//! 1: STORE 0
//! 2: LOAD 0           head: i > end ?
//! 3: PUSH 3
//! 4: GT
//! 5: JMP_IF_FALSE 7   not greater, run the body
//! 6: JMP 14           greater, leave
//! 7: LOAD 0           body
//! 8: PRINT
//! 9: LOAD 0           i = i + 1
//! 10: PUSH 1
//! 11: ADD
//! 12: STORE 0
//! 13: JMP 2
//! 14: HALT
//! ```
//!
//! The bound is re-read on every iteration and the counter wraps like all
//! arithmetic, so `for i = 1 to i` and a loop ending at `i64::MAX` never stop.

pub mod bytecode;

use std::collections::HashMap;

use anyhow::Context;
pub use bytecode::{Bytecode, INSTRUCTION_WIDTH, Instruction, OpCode};
use tracing::{debug, instrument, trace};

use crate::ast::{Expression, Program, Statement};

#[derive(Default)]
pub struct CodeGenerator {
	bytecode: Bytecode,
	/// Slot of every variable seen so far, one flat namespace.
	slots:    HashMap<String, usize>,
}

impl CodeGenerator {
	pub fn new() -> Self { Self::default() }

	#[instrument(name = "generate", skip_all)]
	pub fn generate(mut self, program: &Program) -> anyhow::Result<Bytecode> {
		for statement in &program.statements {
			self.statement(statement)?;
		}
		self.bytecode.emit_op(OpCode::Halt);
		debug!(instructions = self.bytecode.len(), slots = self.slots.len(), "generated bytecode");
		Ok(self.bytecode)
	}

	fn statement(&mut self, statement: &Statement) -> anyhow::Result<()> {
		match statement {
			Statement::VarDecl { name, initializer } => {
				self.expression(initializer)?;
				let slot = self.slot(name)?;
				self.bytecode.emit(OpCode::Store, slot);
			}
			Statement::Print { expression } => {
				self.expression(expression)?;
				self.bytecode.emit_op(OpCode::Print);
			}
			Statement::Block { statements } => {
				for statement in statements {
					self.statement(statement)?;
				}
			}
			Statement::If { condition, then_branch, else_branch } => {
				self.expression(condition)?;
				let jump_to_else = self.bytecode.emit(OpCode::JmpIfFalse, 0);
				self.statement(then_branch)?;

				match else_branch {
					Some(else_branch) => {
						let jump_over_else = self.bytecode.emit(OpCode::Jmp, 0);
						self.patch(jump_to_else)?;
						self.statement(else_branch)?;
						self.patch(jump_over_else)?;
					}
					None => self.patch(jump_to_else)?,
				}
			}
			Statement::For { variable, start, end, body } => {
				self.expression(start)?;
				let slot = self.slot(variable)?;
				self.bytecode.emit(OpCode::Store, slot);

				// The loop continues while `variable > end` is false.
				let loop_start = self.bytecode.address();
				self.bytecode.emit(OpCode::Load, slot);
				self.expression(end)?;
				self.bytecode.emit_op(OpCode::Gt);
				let jump_to_body = self.bytecode.emit(OpCode::JmpIfFalse, 0);
				let exit_jump = self.bytecode.emit(OpCode::Jmp, 0);
				self.patch(jump_to_body)?;

				self.statement(body)?;

				self.bytecode.emit(OpCode::Load, slot);
				self.bytecode.emit(OpCode::Push, 1);
				self.bytecode.emit_op(OpCode::Add);
				self.bytecode.emit(OpCode::Store, slot);
				self.bytecode.emit(OpCode::Jmp, operand(loop_start)?);
				self.patch(exit_jump)?;
			}
		}
		Ok(())
	}

	fn expression(&mut self, expression: &Expression) -> anyhow::Result<()> {
		match expression {
			Expression::Number { value } => {
				self.bytecode.emit(OpCode::Push, *value);
			}
			Expression::Variable { name } => {
				let slot = self.slot(name)?;
				self.bytecode.emit(OpCode::Load, slot);
			}
			Expression::Binary { operator, left, right } => {
				self.expression(left)?;
				self.expression(right)?;
				self.bytecode.emit_op(OpCode::from(*operator));
			}
		}
		Ok(())
	}

	/// Patch the jump at `at` to the next address to be emitted.
	fn patch(&mut self, at: usize) -> anyhow::Result<()> {
		let target = self.bytecode.address();
		trace!(at, target, "patching jump");
		self.bytecode.patch_jump(at, target)
	}

	/// The slot of `name`, assigning the next free one on first sight.
	fn slot(&mut self, name: &str) -> anyhow::Result<i64> {
		let next = self.slots.len();
		let slot = *self.slots.entry(name.to_string()).or_insert_with(|| {
			trace!(name, slot = next, "new variable slot");
			next
		});
		operand(slot)
	}
}

fn operand(value: usize) -> anyhow::Result<i64> { i64::try_from(value).context("Operand does not fit in an i64") }

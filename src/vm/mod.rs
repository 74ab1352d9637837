//! A stack machine for the bytecode in [`crate::codegen`].
//!
//! State is an operand stack of integers, a slot store where unwritten slots
//! read as 0, the output log and a program counter. A machine runs one
//! program and is consumed by it. Any fault ends the run at once, and the
//! output gathered so far goes down with the machine.

use std::collections::HashMap;

use tracing::{debug, instrument, trace};

use crate::{
	RuntimeError,
	ast::BinaryOperator,
	codegen::{Bytecode, INSTRUCTION_WIDTH, Instruction, OpCode},
};

#[derive(Default)]
pub struct VirtualMachine {
	stack:           Vec<i64>,
	slots:           HashMap<usize, i64>,
	output:          Vec<i64>,
	program_counter: usize,
	halted:          bool,
}

impl VirtualMachine {
	pub fn new() -> Self { Self::default() }

	/// Run a program and return everything it printed.
	#[instrument(name = "execute", skip_all)]
	pub fn execute(mut self, bytecode: &Bytecode) -> Result<Vec<i64>, RuntimeError> {
		let instructions = bytecode.instructions();
		while !self.halted {
			let Some(&instruction) = instructions.get(self.program_counter) else {
				break;
			};
			self.step(instruction).inspect_err(|fault| debug!(%fault, "execution aborted"))?;
		}
		debug!(printed = self.output.len(), "execution finished");
		Ok(self.output)
	}

	/// Run an encoded image (see [`Bytecode::encode`]), decoding each
	/// instruction as it is fetched.
	#[instrument(name = "execute_image", skip_all, fields(bytes = image.len()))]
	pub fn execute_image(mut self, image: &[u8]) -> Result<Vec<i64>, RuntimeError> {
		while !self.halted {
			let address = self.program_counter;
			let Some(offset) = address.checked_mul(INSTRUCTION_WIDTH).filter(|&offset| offset < image.len()) else {
				break;
			};
			let instruction = image
				.get(offset..)
				.and_then(|rest| rest.first_chunk::<INSTRUCTION_WIDTH>())
				.ok_or(RuntimeError::TruncatedImage { address })
				.and_then(|bytes| {
					Instruction::decode(bytes).map_err(|byte| RuntimeError::UnknownOpcode { address, byte })
				})
				.inspect_err(|fault| debug!(%fault, "execution aborted"))?;
			self.step(instruction).inspect_err(|fault| debug!(%fault, "execution aborted"))?;
		}
		debug!(printed = self.output.len(), "execution finished");
		Ok(self.output)
	}

	fn step(&mut self, instruction: Instruction) -> Result<(), RuntimeError> {
		let address = self.program_counter;
		trace!(address, %instruction, depth = self.stack.len());
		self.program_counter += 1;

		match instruction.opcode {
			OpCode::Push => self.stack.push(instruction.operand),
			OpCode::Load => {
				let slot = slot(address, instruction.operand)?;
				self.stack.push(self.slots.get(&slot).copied().unwrap_or_default());
			}
			OpCode::Store => {
				let slot = slot(address, instruction.operand)?;
				let value = self.pop(address)?;
				self.slots.insert(slot, value);
			}
			OpCode::Add => self.binary(address, BinaryOperator::Add)?,
			OpCode::Sub => self.binary(address, BinaryOperator::Subtract)?,
			OpCode::Mul => self.binary(address, BinaryOperator::Multiply)?,
			OpCode::Div => self.binary(address, BinaryOperator::Divide)?,
			OpCode::Gt => self.binary(address, BinaryOperator::Greater)?,
			OpCode::Lt => self.binary(address, BinaryOperator::Less)?,
			OpCode::Eq => self.binary(address, BinaryOperator::Equal)?,
			OpCode::Jmp => self.program_counter = jump_target(address, instruction.operand)?,
			OpCode::JmpIfFalse => {
				if self.pop(address)? == 0 {
					self.program_counter = jump_target(address, instruction.operand)?;
				}
			}
			OpCode::Print => {
				let value = self.pop(address)?;
				self.output.push(value);
			}
			OpCode::Halt => self.halted = true,
		}
		Ok(())
	}

	/// Pop right, then left, and push `left op right`.
	fn binary(&mut self, address: usize, operator: BinaryOperator) -> Result<(), RuntimeError> {
		let right = self.pop(address)?;
		let left = self.pop(address)?;
		let result = operator.apply(left, right).ok_or(RuntimeError::DivisionByZero { address })?;
		self.stack.push(result);
		Ok(())
	}

	fn pop(&mut self, address: usize) -> Result<i64, RuntimeError> {
		self.stack.pop().ok_or(RuntimeError::StackUnderflow { address })
	}
}

fn slot(address: usize, operand: i64) -> Result<usize, RuntimeError> {
	usize::try_from(operand).map_err(|_| RuntimeError::InvalidSlot { address, slot: operand })
}

fn jump_target(address: usize, operand: i64) -> Result<usize, RuntimeError> {
	usize::try_from(operand).map_err(|_| RuntimeError::InvalidJumpTarget { address, target: operand })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{codegen::CodeGenerator, parser::Parser, scanner::Scanner};

	fn bytecode(instructions: &[(OpCode, i64)]) -> Bytecode {
		Bytecode::from(instructions.iter().map(|&(opcode, operand)| Instruction::new(opcode, operand)).collect::<Vec<_>>())
	}

	fn compile(input: &str) -> Bytecode {
		let mut parser = Parser::new(Scanner::new(input).scan_tokens());
		let program = parser.parse();
		assert!(!parser.has_errors(), "{:?}", parser.errors());
		CodeGenerator::new().generate(&program).unwrap()
	}

	fn run(input: &str) -> Result<Vec<i64>, RuntimeError> { VirtualMachine::new().execute(&compile(input)) }

	#[test]
	fn arithmetic() {
		assert_eq!(run("print 1 + 2 * 3; print (1 + 2) * 3; print 10 - 4 - 3;"), Ok(vec![7, 9, 3]));
		assert_eq!(run("print 7 / 2; print (0 - 7) / 2; print 7 / (0 - 2);"), Ok(vec![3, -3, -3]));
		assert_eq!(run("print 2 > 1; print 2 < 1; print 3 == 3;"), Ok(vec![1, 0, 1]));
	}

	#[test]
	fn variables() {
		assert_eq!(run("let a = 4; let b = a * a; print b - a;"), Ok(vec![12]));
		assert_eq!(run("let a = 1; let a = 2; print a;"), Ok(vec![2]));
	}

	#[test]
	fn unwritten_slot_reads_zero() {
		assert_eq!(VirtualMachine::new().execute(&bytecode(&[(OpCode::Load, 3), (OpCode::Print, 0)])), Ok(vec![0]));
	}

	#[test]
	fn conditionals() {
		assert_eq!(run("if 1 { print 1; } else { print 2; }"), Ok(vec![1]));
		assert_eq!(run("if 0 { print 1; } else { print 2; }"), Ok(vec![2]));
		assert_eq!(run("if 0 - 5 { print 3; }"), Ok(vec![3]));
		assert_eq!(run("if 0 { print 3; } print 4;"), Ok(vec![4]));
	}

	#[test]
	fn loops() {
		assert_eq!(run("for i = 1 to 3 { print i; }"), Ok(vec![1, 2, 3]));
		assert_eq!(run("for i = 5 to 3 { print i; }"), Ok(vec![]));
		assert_eq!(run("for i = 2 to 2 { print i; }"), Ok(vec![2]));
		assert_eq!(run("for i = 1 to 3 { } print i;"), Ok(vec![4]));
		assert_eq!(run("for i = 1 to 2 { for j = 1 to i { print i * 10 + j; } }"), Ok(vec![11, 21, 22]));
	}

	#[test]
	fn halt_stops_execution() {
		let program = bytecode(&[(OpCode::Push, 1), (OpCode::Print, 0), (OpCode::Halt, 0), (OpCode::Push, 2), (OpCode::Print, 0)]);
		assert_eq!(VirtualMachine::new().execute(&program), Ok(vec![1]));
	}

	#[test]
	fn running_past_the_end_finishes() {
		assert_eq!(VirtualMachine::new().execute(&Bytecode::new()), Ok(vec![]));
		let program = bytecode(&[(OpCode::Push, 6), (OpCode::Print, 0), (OpCode::Jmp, 100), (OpCode::Push, 7), (OpCode::Print, 0)]);
		assert_eq!(VirtualMachine::new().execute(&program), Ok(vec![6]));
	}

	#[test]
	fn stack_underflow() {
		let program = bytecode(&[(OpCode::Push, 1), (OpCode::Add, 0)]);
		assert_eq!(VirtualMachine::new().execute(&program), Err(RuntimeError::StackUnderflow { address: 1 }));
		assert_eq!(
			VirtualMachine::new().execute(&bytecode(&[(OpCode::Print, 0)])),
			Err(RuntimeError::StackUnderflow { address: 0 })
		);
	}

	#[test]
	fn division_by_zero_discards_output() {
		assert_eq!(run("print 1; let x = 5 / 0; print x;"), Err(RuntimeError::DivisionByZero { address: 4 }));
		assert_eq!(run("let z = 0; print 3 / z;"), Err(RuntimeError::DivisionByZero { address: 4 }));
	}

	#[test]
	fn bad_operands() {
		assert_eq!(
			VirtualMachine::new().execute(&bytecode(&[(OpCode::Load, -1)])),
			Err(RuntimeError::InvalidSlot { address: 0, slot: -1 })
		);
		assert_eq!(
			VirtualMachine::new().execute(&bytecode(&[(OpCode::Push, 0), (OpCode::JmpIfFalse, -4)])),
			Err(RuntimeError::InvalidJumpTarget { address: 1, target: -4 })
		);
	}

	#[test]
	fn conditional_jump_pops_before_checking_its_target() {
		assert_eq!(
			VirtualMachine::new().execute(&bytecode(&[(OpCode::JmpIfFalse, -1)])),
			Err(RuntimeError::StackUnderflow { address: 0 })
		);
		// Not taken, so the target is never used.
		let program = bytecode(&[(OpCode::Push, 1), (OpCode::JmpIfFalse, -1), (OpCode::Push, 5), (OpCode::Print, 0)]);
		assert_eq!(VirtualMachine::new().execute(&program), Ok(vec![5]));
		assert_eq!(VirtualMachine::new().execute_image(&program.encode()), Ok(vec![5]));
	}

	#[test]
	fn image_matches_listing() {
		let program = compile("let n = 4; for i = 1 to n { if i == 3 { print 0; } else { print i * n; } }");
		let expected = VirtualMachine::new().execute(&program);
		assert_eq!(expected, Ok(vec![4, 8, 0, 16]));
		assert_eq!(VirtualMachine::new().execute_image(&program.encode()), expected);
	}

	#[test]
	fn unknown_opcode() {
		let mut image = bytecode(&[(OpCode::Push, 1), (OpCode::Print, 0)]).encode();
		image[INSTRUCTION_WIDTH] = 0x2a;
		assert_eq!(VirtualMachine::new().execute_image(&image), Err(RuntimeError::UnknownOpcode { address: 1, byte: 0x2a }));
	}

	#[test]
	fn truncated_image() {
		let mut image = bytecode(&[(OpCode::Push, 1), (OpCode::Print, 0)]).encode();
		image.pop();
		assert_eq!(VirtualMachine::new().execute_image(&image), Err(RuntimeError::TruncatedImage { address: 1 }));
		assert_eq!(VirtualMachine::new().execute_image(&[]), Ok(vec![]));
	}
}

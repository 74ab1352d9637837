//! The instruction set of the stack machine.
//!
//! A program is a flat array of instructions addressed by position. It grows
//! by appending; the only later write is `patch_jump`, which fills in the
//! target of a forward jump once the code it jumps to has been emitted.

use anyhow::{Context, bail};
use serde::{Serialize, Serializer};

use crate::ast::BinaryOperator;

/// Bytes per instruction in the encoded image: the opcode, then the operand
/// as a little-endian `i64`.
pub const INSTRUCTION_WIDTH: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum OpCode {
	/// Push the operand.
	Push = 0,
	/// Push the value of slot `operand`, 0 if it was never stored.
	Load,
	/// Pop into slot `operand`.
	Store,
	Add,
	Sub,
	Mul,
	Div,
	Gt,
	Lt,
	Eq,
	/// Continue at address `operand`.
	Jmp,
	/// Pop; continue at address `operand` if the value is 0.
	JmpIfFalse,
	/// Pop and append to the output.
	Print,
	Halt,
}

impl OpCode {
	pub fn name(self) -> &'static str {
		use OpCode::*;
		match self {
			Push => "PUSH",
			Load => "LOAD",
			Store => "STORE",
			Add => "ADD",
			Sub => "SUB",
			Mul => "MUL",
			Div => "DIV",
			Gt => "GT",
			Lt => "LT",
			Eq => "EQ",
			Jmp => "JMP",
			JmpIfFalse => "JMP_IF_FALSE",
			Print => "PRINT",
			Halt => "HALT",
		}
	}

	/// Whether the operand carries meaning for this opcode.
	pub fn has_operand(self) -> bool {
		matches!(self, OpCode::Push | OpCode::Load | OpCode::Store | OpCode::Jmp | OpCode::JmpIfFalse)
	}

	pub fn is_jump(self) -> bool { matches!(self, OpCode::Jmp | OpCode::JmpIfFalse) }
}

impl From<BinaryOperator> for OpCode {
	fn from(operator: BinaryOperator) -> Self {
		match operator {
			BinaryOperator::Add => OpCode::Add,
			BinaryOperator::Subtract => OpCode::Sub,
			BinaryOperator::Multiply => OpCode::Mul,
			BinaryOperator::Divide => OpCode::Div,
			BinaryOperator::Greater => OpCode::Gt,
			BinaryOperator::Less => OpCode::Lt,
			BinaryOperator::Equal => OpCode::Eq,
		}
	}
}

impl TryFrom<u8> for OpCode {
	type Error = u8;

	fn try_from(byte: u8) -> Result<Self, Self::Error> {
		use OpCode::*;
		Ok(match byte {
			0 => Push,
			1 => Load,
			2 => Store,
			3 => Add,
			4 => Sub,
			5 => Mul,
			6 => Div,
			7 => Gt,
			8 => Lt,
			9 => Eq,
			10 => Jmp,
			11 => JmpIfFalse,
			12 => Print,
			13 => Halt,
			_ => return Err(byte),
		})
	}
}

impl std::fmt::Display for OpCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
	pub opcode:  OpCode,
	pub operand: i64,
}

impl Instruction {
	pub fn new(opcode: OpCode, operand: i64) -> Self { Self { opcode, operand } }

	/// Decode one instruction, failing with the opcode byte when it is unknown.
	pub fn decode(bytes: &[u8; INSTRUCTION_WIDTH]) -> Result<Self, u8> {
		let [opcode, operand @ ..] = *bytes;
		Ok(Self { opcode: OpCode::try_from(opcode)?, operand: i64::from_le_bytes(operand) })
	}

	pub fn encode(&self) -> [u8; INSTRUCTION_WIDTH] {
		let mut bytes = [0; INSTRUCTION_WIDTH];
		bytes[0] = self.opcode as u8;
		bytes[1..].copy_from_slice(&self.operand.to_le_bytes());
		bytes
	}
}

impl std::fmt::Display for Instruction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.opcode.has_operand() { write!(f, "{} {}", self.opcode, self.operand) } else { write!(f, "{}", self.opcode) }
	}
}

/// A complete program for the virtual machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bytecode {
	instructions: Vec<Instruction>,
}

impl Bytecode {
	pub fn new() -> Self { Self::default() }

	/// Append an instruction and return its address.
	pub fn emit(&mut self, opcode: OpCode, operand: i64) -> usize {
		self.instructions.push(Instruction::new(opcode, operand));
		self.instructions.len() - 1
	}

	/// Append an instruction without an operand.
	pub fn emit_op(&mut self, opcode: OpCode) -> usize { self.emit(opcode, 0) }

	/// The address the next emitted instruction will get.
	pub fn address(&self) -> usize { self.instructions.len() }

	/// Point the jump at `at` to `target`.
	pub fn patch_jump(&mut self, at: usize, target: usize) -> anyhow::Result<()> {
		let target = i64::try_from(target).context("Jump target does not fit an operand")?;
		let Some(instruction) = self.instructions.get_mut(at) else {
			bail!("No instruction at address {at} to patch");
		};
		if !instruction.opcode.is_jump() {
			bail!("Instruction {instruction} at address {at} is not a jump");
		}
		instruction.operand = target;
		Ok(())
	}

	pub fn instructions(&self) -> &[Instruction] { &self.instructions }

	pub fn len(&self) -> usize { self.instructions.len() }

	pub fn is_empty(&self) -> bool { self.instructions.is_empty() }

	/// The compact binary image executed by `VirtualMachine::execute_image`.
	pub fn encode(&self) -> Vec<u8> { self.instructions.iter().flat_map(Instruction::encode).collect() }
}

impl From<Vec<Instruction>> for Bytecode {
	fn from(instructions: Vec<Instruction>) -> Self { Self { instructions } }
}

/// Numbered listing, one instruction per line.
impl std::fmt::Display for Bytecode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (address, instruction) in self.instructions.iter().enumerate() {
			writeln!(f, "{address}: {instruction}")?;
		}
		Ok(())
	}
}

#[derive(Serialize)]
struct ListingEntry {
	address: usize,
	opcode:  OpCode,
	#[serde(skip_serializing_if = "Option::is_none")]
	operand: Option<i64>,
}

impl Serialize for Bytecode {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_seq(self.instructions.iter().enumerate().map(|(address, instruction)| ListingEntry {
			address,
			opcode: instruction.opcode,
			operand: instruction.opcode.has_operand().then_some(instruction.operand),
		}))
	}
}

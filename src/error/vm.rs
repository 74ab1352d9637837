/// Faults raised by the virtual machine. Every fault ends the run.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
	#[error("Stack underflow at address {address}")]
	StackUnderflow { address: usize },
	#[error("Division by zero at address {address}")]
	DivisionByZero { address: usize },
	#[error("Unknown opcode {byte:#04x} at address {address}")]
	UnknownOpcode { address: usize, byte: u8 },
	#[error("Invalid variable slot {slot} at address {address}")]
	InvalidSlot { address: usize, slot: i64 },
	#[error("Invalid jump target {target} at address {address}")]
	InvalidJumpTarget { address: usize, target: i64 },
	#[error("Truncated instruction at address {address}")]
	TruncatedImage { address: usize },
}

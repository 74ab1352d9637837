/// A syntax error with the position of the token it was reported at.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Parse error at line {line}, column {column}: {type}")]
pub struct ParseError {
	line:   usize,
	column: usize,
	r#type: ParseErrorType,
}

impl ParseError {
	pub fn new(line: usize, column: usize, r#type: ParseErrorType) -> Self { Self { line, column, r#type } }

	pub fn line(&self) -> usize { self.line }

	pub fn column(&self) -> usize { self.column }

	pub fn r#type(&self) -> &ParseErrorType { &self.r#type }
}

/// What the parser was looking for when it gave up on the current token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorType {
	/// No statement starts with the current token.
	ExpectedStatement,
	/// No expression starts with the current token.
	ExpectedExpression,
	/// A specific token was required, e.g. `';' after print statement`.
	Expected(&'static str),
	/// The digits of an integer literal do not fit in an `i64`.
	IntegerOutOfRange(String),
	/// An expression nests past the parser's depth limit.
	ExpressionTooDeep,
	/// Blocks nest past the parser's depth limit.
	BlockTooDeep,
}

impl std::fmt::Display for ParseErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ParseErrorType::*;
		match self {
			ExpectedStatement => write!(f, "Expected statement"),
			ExpectedExpression => write!(f, "Expected expression"),
			Expected(what) => write!(f, "Expected {what}"),
			IntegerOutOfRange(digits) => write!(f, "Integer literal '{digits}' is out of range"),
			ExpressionTooDeep => write!(f, "Expression nested too deeply"),
			BlockTooDeep => write!(f, "Blocks nested too deeply"),
		}
	}
}

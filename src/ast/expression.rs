//! Expression AST nodes
//!
//! An `Expression` is a tree structure representing code like `a * (2 + 3)`
//! as nested nodes. Each node owns its operands.

use serde::Serialize;

use crate::scanner::TokenType;

/// Expression AST nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Expression {
	Number { value: i64 },
	Variable { name: String },
	Binary { operator: BinaryOperator, left: Box<Expression>, right: Box<Expression> },
}

impl Expression {
	pub fn number(value: i64) -> Self { Expression::Number { value } }

	pub fn variable(name: impl Into<String>) -> Self { Expression::Variable { name: name.into() } }

	pub fn binary(left: Self, operator: BinaryOperator, right: Self) -> Self {
		Expression::Binary { operator, left: Box::new(left), right: Box::new(right) }
	}

	/// The literal value, if this node is a literal.
	pub fn as_number(&self) -> Option<i64> {
		match self {
			Expression::Number { value } => Some(*value),
			_ => None,
		}
	}
}

impl std::fmt::Display for Expression {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Expression::Number { value } => write!(f, "{value}"),
			Expression::Variable { name } => write!(f, "{name}"),
			Expression::Binary { operator, left, right } => write!(f, "({operator} {left} {right})"),
		}
	}
}

/// The seven binary operators. Comparisons produce `1` or `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
	#[serde(rename = "+")]
	Add,
	#[serde(rename = "-")]
	Subtract,
	#[serde(rename = "*")]
	Multiply,
	#[serde(rename = "/")]
	Divide,
	#[serde(rename = ">")]
	Greater,
	#[serde(rename = "<")]
	Less,
	#[serde(rename = "==")]
	Equal,
}

impl BinaryOperator {
	pub fn from_token(r#type: TokenType) -> Option<Self> {
		use BinaryOperator::*;
		Some(match r#type {
			TokenType::Plus => Add,
			TokenType::Minus => Subtract,
			TokenType::Star => Multiply,
			TokenType::Slash => Divide,
			TokenType::Greater => Greater,
			TokenType::Less => Less,
			TokenType::EqualEqual => Equal,
			_ => return None,
		})
	}

	pub fn symbol(self) -> &'static str {
		use BinaryOperator::*;
		match self {
			Add => "+",
			Subtract => "-",
			Multiply => "*",
			Divide => "/",
			Greater => ">",
			Less => "<",
			Equal => "==",
		}
	}

	/// Apply the operator. Arithmetic wraps on overflow and division
	/// truncates toward zero; `None` means division by zero.
	///
	/// Both the optimizer and the virtual machine evaluate through here, so
	/// folded constants always match what execution would have produced.
	pub fn apply(self, left: i64, right: i64) -> Option<i64> {
		use BinaryOperator::*;
		Some(match self {
			Add => left.wrapping_add(right),
			Subtract => left.wrapping_sub(right),
			Multiply => left.wrapping_mul(right),
			Divide => {
				if right == 0 {
					return None;
				}
				left.wrapping_div(right)
			}
			Greater => i64::from(left > right),
			Less => i64::from(left < right),
			Equal => i64::from(left == right),
		})
	}
}

impl std::fmt::Display for BinaryOperator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.symbol()) }
}

//! The syntax tree shared by every pass after the parser.
//!
//! There is no place in the grammar where both an expression and a statement
//! are allowed. The operands of `+` are always expressions, the body of a
//! `for` loop is always a block statement.
//!
//! The tree is strictly owned: passes that rewrite it (the optimizer) take a
//! subtree by value and hand back its replacement.

pub mod expression;

pub use expression::{BinaryOperator, Expression};
use serde::Serialize;

/// A whole program, the root of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Program {
	pub statements: Vec<Statement>,
}

/// A statement in the language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Statement {
	/// `let name = initializer;`
	VarDecl { name: String, initializer: Expression },
	/// `print expression;`
	Print { expression: Expression },
	/// `{ statements }`
	Block { statements: Vec<Statement> },
	If {
		condition:   Expression,
		then_branch: Box<Statement>,
		#[serde(skip_serializing_if = "Option::is_none")]
		else_branch: Option<Box<Statement>>,
	},
	/// `for variable = start to end { body }`, the bound is inclusive.
	For { variable: String, start: Expression, end: Expression, body: Box<Statement> },
}

impl Statement {
	/// Push every name this statement declares, nested ones included.
	pub fn collect_declarations<'s>(&'s self, names: &mut Vec<&'s str>) {
		match self {
			Statement::VarDecl { name, .. } => names.push(name),
			Statement::Print { .. } => {}
			Statement::Block { statements } => statements.iter().for_each(|s| s.collect_declarations(names)),
			Statement::If { then_branch, else_branch, .. } => {
				then_branch.collect_declarations(names);
				if let Some(else_branch) = else_branch {
					else_branch.collect_declarations(names);
				}
			}
			Statement::For { variable, body, .. } => {
				names.push(variable);
				body.collect_declarations(names);
			}
		}
	}
}

impl std::fmt::Display for Statement {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Statement::VarDecl { name, initializer } => write!(f, "(let {name} {initializer})"),
			Statement::Print { expression } => write!(f, "(print {expression})"),
			Statement::Block { statements } => {
				write!(f, "(block")?;
				for statement in statements {
					write!(f, " {statement}")?;
				}
				write!(f, ")")
			}
			Statement::If { condition, then_branch, else_branch: None } => write!(f, "(if {condition} {then_branch})"),
			Statement::If { condition, then_branch, else_branch: Some(else_branch) } => {
				write!(f, "(if {condition} {then_branch} {else_branch})")
			}
			Statement::For { variable, start, end, body } => write!(f, "(for {variable} {start} {end} {body})"),
		}
	}
}

impl std::fmt::Display for Program {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for statement in &self.statements {
			writeln!(f, "{statement}")?;
		}
		Ok(())
	}
}

//! Name resolution over the flat namespace.
//!
//! The language has one global scope. A name declared inside an `if` or
//! `for` body stays visible after the body ends, which is what the generated
//! code does as well: every name owns one slot for the whole program.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
	SemanticError, SemanticWarning,
	ast::{Expression, Program, Statement},
};

/// Walks the tree once, in evaluation order, and records what it finds.
#[derive(Default)]
pub struct SemanticAnalyzer {
	declared: HashSet<String>,
	errors:   Vec<SemanticError>,
	warnings: Vec<SemanticWarning>,
}

impl SemanticAnalyzer {
	pub fn new() -> Self { Self::default() }

	#[instrument(name = "analyze", skip_all)]
	pub fn analyze(mut self, program: &Program) -> SemanticReport {
		for statement in &program.statements {
			self.statement(statement);
		}
		debug!(errors = self.errors.len(), warnings = self.warnings.len(), "semantic analysis done");
		SemanticReport { errors: self.errors, warnings: self.warnings }
	}

	fn statement(&mut self, statement: &Statement) {
		match statement {
			Statement::VarDecl { name, initializer } => {
				// The initializer is checked first, `let x = x;` reads an undefined `x`.
				self.expression(initializer);
				self.declare(name);
			}
			Statement::Print { expression } => self.expression(expression),
			Statement::Block { statements } => statements.iter().for_each(|s| self.statement(s)),
			Statement::If { condition, then_branch, else_branch } => {
				self.expression(condition);
				self.statement(then_branch);
				if let Some(else_branch) = else_branch {
					self.statement(else_branch);
				}
			}
			Statement::For { variable, start, end, body } => {
				self.expression(start);
				self.expression(end);
				self.declare(variable);
				self.statement(body);
			}
		}
	}

	fn expression(&mut self, expression: &Expression) {
		match expression {
			Expression::Number { .. } => {}
			Expression::Variable { name } => {
				if !self.declared.contains(name) {
					self.errors.push(SemanticError::UndefinedVariable(name.clone()));
				}
			}
			Expression::Binary { left, right, .. } => {
				self.expression(left);
				self.expression(right);
			}
		}
	}

	fn declare(&mut self, name: &str) {
		if !self.declared.insert(name.to_string()) {
			self.warnings.push(SemanticWarning::Redeclared(name.to_string()));
		}
	}
}

/// Outcome of semantic analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SemanticReport {
	pub errors:   Vec<SemanticError>,
	pub warnings: Vec<SemanticWarning>,
}

impl SemanticReport {
	pub fn has_errors(&self) -> bool { !self.errors.is_empty() }
}

impl std::fmt::Display for SemanticReport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		if self.errors.is_empty() && self.warnings.is_empty() {
			return writeln!(f, "Semantic analysis passed with no errors or warnings.");
		}
		if !self.errors.is_empty() {
			writeln!(f, "Errors:")?;
			for error in &self.errors {
				writeln!(f, "  - Semantic error: {error}")?;
			}
		}
		if !self.warnings.is_empty() {
			writeln!(f, "Warnings:")?;
			for warning in &self.warnings {
				writeln!(f, "  - Warning: {warning}")?;
			}
		}
		Ok(())
	}
}

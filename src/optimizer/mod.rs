//! Constant folding and constant propagation in a single pass.
//!
//! Folding happens bottom-up on binary nodes: once both operands are known
//! integers the node is replaced by its value. Known integers are literals and
//! variables whose declaration was given a literal (possibly after folding).
//!
//! `pennyArea = 3 * (6 / 2) * (6 / 2);` becomes `pennyArea = 27;`
//!
//! The table of known variables follows program order. A fact is dropped
//! when it can stop being true for later reads:
//!
//! - a redeclaration with a non-constant initializer,
//! - a declaration in only one branch of an `if` (or different values in the
//!   two branches),
//! - a declaration inside a `for` body or the loop variable itself, because
//!   the body and the loop bound are evaluated again on every iteration.
//!
//! Division by a known zero is never folded; the program keeps the division
//! and faults when it runs.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::ast::{BinaryOperator, Expression, Program, Statement};

#[derive(Default)]
pub struct Optimizer {
	/// Variables currently known to hold a constant.
	constants:     HashMap<String, i64>,
	optimizations: Vec<Optimization>,
}

impl Optimizer {
	pub fn new() -> Self { Self::default() }

	/// Optimize the program, returning the rewritten tree.
	#[instrument(name = "optimize", skip_all)]
	pub fn optimize(&mut self, program: Program) -> Program {
		self.constants.clear();
		self.optimizations.clear();
		let statements = program.statements.into_iter().map(|s| self.statement(s)).collect();
		debug!(applied = self.optimizations.len(), "optimization done");
		Program { statements }
	}

	/// What the last `optimize` call changed.
	pub fn report(&self) -> OptimizationReport { OptimizationReport { optimizations: self.optimizations.clone() } }

	pub fn into_report(self) -> OptimizationReport { OptimizationReport { optimizations: self.optimizations } }

	fn statement(&mut self, statement: Statement) -> Statement {
		match statement {
			Statement::VarDecl { name, initializer } => {
				let initializer = self.expression(initializer);
				match initializer.as_number() {
					Some(value) => {
						trace!(name = %name, value, "variable is constant");
						self.constants.insert(name.clone(), value);
					}
					None => {
						self.constants.remove(&name);
					}
				}
				Statement::VarDecl { name, initializer }
			}
			Statement::Print { expression } => Statement::Print { expression: self.expression(expression) },
			Statement::Block { statements } => {
				Statement::Block { statements: statements.into_iter().map(|s| self.statement(s)).collect() }
			}
			Statement::If { condition, then_branch, else_branch } => {
				let condition = self.expression(condition);
				let before = self.constants.clone();
				let then_branch = Box::new(self.statement(*then_branch));
				let after_then = std::mem::replace(&mut self.constants, before);
				let else_branch = else_branch.map(|branch| Box::new(self.statement(*branch)));
				// Keep only what holds on both paths.
				self.constants.retain(|name, value| after_then.get(name) == Some(value));
				Statement::If { condition, then_branch, else_branch }
			}
			Statement::For { variable, start, end, body } => {
				let start = self.expression(start);
				let mut assigned = vec![variable.as_str()];
				body.collect_declarations(&mut assigned);
				let assigned: Vec<String> = assigned.into_iter().map(str::to_string).collect();

				self.forget(&assigned);
				let end = self.expression(end);
				let body = Box::new(self.statement(*body));
				self.forget(&assigned);
				Statement::For { variable, start, end, body }
			}
		}
	}

	fn expression(&mut self, expression: Expression) -> Expression {
		let (operator, left, right) = match expression {
			Expression::Binary { operator, left, right } => (operator, left, right),
			other => return other,
		};
		let left = self.expression(*left);
		let right = self.expression(*right);

		let (Some(left_value), Some(right_value)) = (self.constant(&left), self.constant(&right)) else {
			return Expression::binary(left, operator, right);
		};
		let Some(result) = operator.apply(left_value, right_value) else {
			debug!(left = left_value, "not folding a division by zero");
			return Expression::binary(left, operator, right);
		};

		self.note_propagation(&left, left_value);
		self.note_propagation(&right, right_value);
		self.record(Optimization::Folded { left: left_value, operator, right: right_value, result });
		Expression::number(result)
	}

	/// The statically known value of an already optimized operand.
	fn constant(&self, expression: &Expression) -> Option<i64> {
		match expression {
			Expression::Number { value } => Some(*value),
			Expression::Variable { name } => self.constants.get(name).copied(),
			Expression::Binary { .. } => None,
		}
	}

	fn note_propagation(&mut self, operand: &Expression, value: i64) {
		if let Expression::Variable { name } = operand {
			self.record(Optimization::Propagated { name: name.clone(), value });
		}
	}

	fn record(&mut self, optimization: Optimization) {
		debug!(%optimization, "applied");
		self.optimizations.push(optimization);
	}

	fn forget(&mut self, names: &[String]) {
		for name in names {
			self.constants.remove(name);
		}
	}
}

/// One applied transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Optimization {
	/// A binary node was replaced by its value.
	Folded { left: i64, operator: BinaryOperator, right: i64, result: i64 },
	/// A variable operand was replaced by its known value during a fold.
	Propagated { name: String, value: i64 },
}

impl std::fmt::Display for Optimization {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Optimization::Folded { left, operator, right, result } => {
				write!(f, "Constant folding: {left} {operator} {right} = {result}")
			}
			Optimization::Propagated { name, value } => write!(f, "Constant propagation: {name} = {value}"),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizationReport {
	pub optimizations: Vec<Optimization>,
}

impl OptimizationReport {
	/// Whether the pass changed anything.
	pub fn applied(&self) -> bool { !self.optimizations.is_empty() }
}

impl std::fmt::Display for OptimizationReport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "Optimization Report:")?;
		if self.optimizations.is_empty() {
			return writeln!(f, "  - No optimizations applied");
		}
		for optimization in &self.optimizations {
			writeln!(f, "  - {optimization}")?;
		}
		Ok(())
	}
}

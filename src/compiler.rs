use std::{fs::read_to_string, io::Write, path::Path};

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
	CompileError,
	ast::Program,
	codegen::{Bytecode, CodeGenerator},
	optimizer::{OptimizationReport, Optimizer},
	parser::Parser,
	scanner::{Scanner, Token, display_tokens},
	semantic::{SemanticAnalyzer, SemanticReport},
	vm::VirtualMachine,
};

/// Compiler drives source text through every stage of the pipeline.
///
/// It holds no state, each call builds fresh stage objects.
pub struct Compiler;

impl Compiler {
	/// Scan the source into tokens. Scanning never fails.
	pub fn tokenize<'a>(&self, source: &'a str) -> Vec<Token<'a>> { Scanner::new(source).scan_tokens() }

	/// Parse the source, failing with every syntax error found.
	pub fn parse(&self, source: &str) -> Result<Program, CompileError> {
		let mut parser = Parser::new(self.tokenize(source));
		let program = parser.parse();
		if parser.has_errors() {
			return Err(CompileError::ParseErrors(parser.into_errors()));
		}
		Ok(program)
	}

	/// Run semantic analysis. Semantic errors are part of the report, only a
	/// syntax error fails the call.
	pub fn analyze(&self, source: &str) -> Result<SemanticReport, CompileError> {
		let program = self.parse(source)?;
		Ok(SemanticAnalyzer::new().analyze(&program))
	}

	/// Optimize a checked program and return what changed.
	pub fn optimize(&self, source: &str) -> Result<OptimizationReport, CompileError> {
		let mut optimizer = Optimizer::new();
		optimizer.optimize(self.checked(source)?);
		Ok(optimizer.into_report())
	}

	pub fn generate(&self, source: &str) -> Result<Bytecode, CompileError> {
		let program = Optimizer::new().optimize(self.checked(source)?);
		Ok(CodeGenerator::new().generate(&program)?)
	}

	/// Compile and execute, returning every printed value in order.
	pub fn run(&self, source: &str) -> Result<Vec<i64>, CompileError> {
		let bytecode = self.generate(source)?;
		Ok(VirtualMachine::new().execute(&bytecode)?)
	}

	/// Run every stage up to code generation and collect their artifacts.
	pub fn compile<'a>(&self, source: &'a str) -> CompilationResult<'a> { self.pipeline(source, false) }

	/// Like [`Compiler::compile`], then execute the generated bytecode.
	pub fn compile_and_run<'a>(&self, source: &'a str) -> CompilationResult<'a> { self.pipeline(source, true) }

	/// Read a source file from disk.
	pub fn read_source<P: AsRef<Path>>(&self, path: P) -> Result<String, CompileError> {
		let path = path.as_ref();
		Ok(read_to_string(path).with_context(|| format!("Failed open source file {}", path.display()))?)
	}

	/// Compile and execute a source file.
	pub fn run_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<i64>, CompileError> {
		let source = self.read_source(path)?;
		self.run(&source)
	}

	/// Run the REPL prompt, one program per line.
	pub fn run_prompt(&self) {
		let mut input = String::new();
		let stdin = std::io::stdin();
		loop {
			input.clear();
			print!("> ");
			if let Err(e) = std::io::stdout().flush() {
				eprintln!("Failed flush: {e}");
			}
			match stdin.read_line(&mut input) {
				Ok(0) => {
					println!("\nExited tinyc repl");
					break;
				}
				Ok(_) => {}
				Err(e) => {
					eprintln!("Failed read line: {e}");
					continue;
				}
			}
			match self.run(input.trim()) {
				Ok(output) => output.iter().for_each(|value| println!("{value}")),
				Err(e) => eprintln!("{e}"),
			}
		}
	}
}

impl Compiler {
	/// Parse and analyze, failing on any semantic error.
	fn checked(&self, source: &str) -> Result<Program, CompileError> {
		let program = self.parse(source)?;
		let report = SemanticAnalyzer::new().analyze(&program);
		if report.has_errors() {
			return Err(CompileError::SemanticErrors(report.errors));
		}
		Ok(program)
	}

	#[instrument(name = "compile", skip_all, fields(execute = execute))]
	fn pipeline<'a>(&self, source: &'a str, execute: bool) -> CompilationResult<'a> {
		let tokens = self.tokenize(source);
		let mut result = CompilationResult { tokens: tokens.clone(), ..Default::default() };

		let mut parser = Parser::new(tokens);
		let program = parser.parse();
		if parser.has_errors() {
			return result.fail(CompileError::ParseErrors(parser.into_errors()));
		}
		result.ast = Some(program.clone());

		let report = SemanticAnalyzer::new().analyze(&program);
		let errors = report.errors.clone();
		result.semantic = Some(report);
		if !errors.is_empty() {
			return result.fail(CompileError::SemanticErrors(errors));
		}

		let mut optimizer = Optimizer::new();
		let program = optimizer.optimize(program);
		result.optimization = Some(optimizer.into_report());

		let bytecode = match CodeGenerator::new().generate(&program) {
			Ok(bytecode) => bytecode,
			Err(e) => return result.fail(e.into()),
		};

		if execute {
			match VirtualMachine::new().execute(&bytecode) {
				Ok(output) => result.output = output,
				Err(fault) => {
					result.bytecode = Some(bytecode);
					return result.fail(fault.into());
				}
			}
		}
		result.bytecode = Some(bytecode);
		result.success = true;
		result
	}
}

/// Everything one compilation produced. Stages that did not run leave their
/// artifact empty.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult<'a> {
	pub success:      bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error:        Option<String>,
	pub tokens:       Vec<Token<'a>>,
	/// The tree as parsed, before optimization.
	pub ast:          Option<Program>,
	pub semantic:     Option<SemanticReport>,
	pub optimization: Option<OptimizationReport>,
	pub bytecode:     Option<Bytecode>,
	pub output:       Vec<i64>,
}

impl CompilationResult<'_> {
	fn fail(mut self, error: CompileError) -> Self {
		debug!(%error, "compilation failed");
		self.success = false;
		self.error = Some(error.to_string());
		self.output.clear();
		self
	}

	pub fn to_json(&self) -> serde_json::Result<String> { serde_json::to_string_pretty(self) }
}

impl std::fmt::Display for CompilationResult<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "Tokens:\n{}", display_tokens(&self.tokens))?;
		if let Some(ast) = &self.ast {
			write!(f, "\nAST:\n{ast}")?;
		}
		if let Some(semantic) = &self.semantic {
			write!(f, "\n{semantic}")?;
		}
		if let Some(optimization) = &self.optimization {
			write!(f, "\n{optimization}")?;
		}
		if let Some(bytecode) = &self.bytecode {
			write!(f, "\nBytecode:\n{bytecode}")?;
		}
		if !self.output.is_empty() {
			writeln!(f, "\nOutput:")?;
			for value in &self.output {
				writeln!(f, "{value}")?;
			}
		}
		if let Some(error) = &self.error {
			writeln!(f, "\nError: {error}")?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{RuntimeError, SemanticError, SemanticWarning};

	#[test]
	fn stages() {
		let compiler = Compiler;
		assert_eq!(compiler.tokenize("print 1;").len(), 4);
		assert_eq!(compiler.parse("print 1;").unwrap().to_string(), "(print 1)\n");
		assert_eq!(compiler.analyze("print y;").unwrap().errors, vec![SemanticError::UndefinedVariable(
			"y".to_string()
		)]);
		assert!(compiler.optimize("print 1 + 1;").unwrap().applied());
		assert_eq!(compiler.generate("print 2 * 3;").unwrap().to_string(), "0: PUSH 6\n1: PRINT\n2: HALT\n");
		assert_eq!(compiler.run("for i = 1 to 3 { print i; }").unwrap(), vec![1, 2, 3]);
	}

	#[test]
	fn stage_errors() {
		let compiler = Compiler;
		assert!(matches!(compiler.parse("print ;"), Err(CompileError::ParseErrors(errors)) if errors.len() == 1));
		assert!(matches!(compiler.analyze("let = 1;"), Err(CompileError::ParseErrors(_))));
		assert!(matches!(compiler.optimize("print y;"), Err(CompileError::SemanticErrors(_))));
		assert!(matches!(compiler.generate("print y;"), Err(CompileError::SemanticErrors(_))));
		assert!(matches!(
			compiler.run("let x = 5 / 0; print x;"),
			Err(CompileError::Runtime(RuntimeError::DivisionByZero { .. }))
		));
	}

	#[test]
	fn successful_compilation() {
		let result = Compiler.compile_and_run("let a = 2 + 3; print a;");
		assert!(result.success);
		assert_eq!(result.error, None);
		assert_eq!(result.output, vec![5]);
		assert_eq!(result.ast.as_ref().unwrap().to_string(), "(let a (+ 2 3))\n(print a)\n");
		assert!(result.optimization.as_ref().unwrap().applied());
		assert_eq!(result.bytecode.as_ref().unwrap().len(), 5);

		let compiled = Compiler.compile("let a = 2 + 3; print a;");
		assert!(compiled.success);
		assert!(compiled.output.is_empty());
		assert_eq!(compiled.bytecode, result.bytecode);
	}

	#[test]
	fn parse_failure_leaves_later_stages_empty() {
		let result = Compiler.compile_and_run("let x 5;");
		assert!(!result.success);
		assert_eq!(result.error.as_deref(), Some("Parse error at line 1, column 7: Expected '=' after variable name"));
		assert!(!result.tokens.is_empty());
		assert!(result.ast.is_none());
		assert!(result.semantic.is_none());
		assert!(result.bytecode.is_none());
	}

	#[test]
	fn semantic_failure_keeps_report() {
		let result = Compiler.compile_and_run("print y;");
		assert!(!result.success);
		assert!(result.error.as_deref().unwrap().contains('y'));
		assert!(result.semantic.as_ref().unwrap().has_errors());
		assert!(result.optimization.is_none());
		assert!(result.bytecode.is_none());
	}

	#[test]
	fn runtime_fault_drops_output() {
		let result = Compiler.compile_and_run("print 1; let x = 5 / 0; print x;");
		assert!(!result.success);
		assert_eq!(result.error.as_deref(), Some("Execution error: Division by zero at address 4"));
		assert!(result.output.is_empty());
		assert!(result.bytecode.is_some());
	}

	#[test]
	fn warnings_do_not_fail() {
		let result = Compiler.compile_and_run("let a = 1; let a = 2; print a;");
		assert!(result.success);
		assert_eq!(result.output, vec![2]);
		assert_eq!(result.semantic.unwrap().warnings, vec![SemanticWarning::Redeclared("a".to_string())]);
	}

	#[test]
	fn structured_result() {
		let json: serde_json::Value =
			serde_json::from_str(&Compiler.compile_and_run("print 1 < 2;").to_json().unwrap()).unwrap();
		assert_eq!(json["success"], true);
		assert!(json.get("error").is_none());
		assert_eq!(json["tokens"][0]["type"], "PRINT");
		assert_eq!(json["ast"]["statements"][0]["type"], "Print");
		assert_eq!(json["optimization"]["optimizations"][0]["kind"], "folded");
		assert_eq!(json["bytecode"][0], serde_json::json!({ "address": 0, "opcode": "PUSH", "operand": 1 }));
		assert_eq!(json["output"], serde_json::json!([1]));

		let json: serde_json::Value = serde_json::from_str(&Compiler.compile("print y;").to_json().unwrap()).unwrap();
		assert_eq!(json["success"], false);
		assert_eq!(json["semantic"]["errors"][0], "Undefined variable 'y'");
		assert_eq!(json["bytecode"], serde_json::Value::Null);
	}

	#[test]
	fn missing_file() {
		assert!(matches!(Compiler.run_file("does/not/exist.tiny"), Err(CompileError::InternalError(_))));
	}
}

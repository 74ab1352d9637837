pub mod parser;
pub mod semantic;
pub mod vm;

use crate::{ParseError, RuntimeError, SemanticError};

/// CompileError is the top-level error type of the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
	/// Internal compiler error, should never happen
	#[error("CompilerInternalError: {0}")]
	InternalError(#[from] anyhow::Error),
	/// Syntax errors collected while parsing
	#[error("{}", display_lines(.0))]
	ParseErrors(Vec<ParseError>),
	/// Errors reported by semantic analysis
	#[error("{}", display_lines(.0))]
	SemanticErrors(Vec<SemanticError>),
	/// Fault raised by the virtual machine
	#[error("Execution error: {0}")]
	Runtime(#[from] RuntimeError),
}

fn display_lines<T: std::fmt::Display>(errors: &[T]) -> String {
	errors.iter().map(|e| e.to_string()).collect::<Vec<String>>().join("\n")
}

/// Serialize a diagnostic through its `Display` form.
macro_rules! serialize_as_display {
	($($ty:ty),+ $(,)?) => {
		$(
			impl serde::Serialize for $ty {
				fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
					serializer.collect_str(self)
				}
			}
		)+
	};
}

serialize_as_display!(ParseError, SemanticError, crate::SemanticWarning, RuntimeError);

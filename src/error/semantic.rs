/// Errors found by semantic analysis, each one aborts the pipeline.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
	#[error("Undefined variable '{0}'")]
	UndefinedVariable(String),
}

/// Informational findings that never stop compilation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticWarning {
	#[error("Variable '{0}' redeclared")]
	Redeclared(String),
}

//! # From source text to printed integers
//!
//! User's source code: `let area = (width + 2) * 3;`

//! ## Scanning
//!
//! The scanner walks the characters once and groups them into tokens:
//! keywords `let`, identifiers `area`, integer literals `3` and one or two
//! character operators `==`. Every token remembers the line and column it
//! started at, so later stages can point back into the source.
//!
//! Whitespace and `//` comments are dropped. A character the language does not
//! know becomes an `INVALID` token instead of an error, the parser is the one
//! who complains about it.
//!
//! `[LET 'let' 1:1, IDENTIFIER 'area' 1:5, EQUAL '=' 1:10, ...]`

//! ## Parsing
//!
//! Recursive descent over the token list builds the syntax tree. Precedence
//! comes from the call structure: `comparison` calls `term`, `term` calls
//! `factor`, `factor` calls `primary`.
//!
//! ``` markdown
//! area (VarDecl)
//! └── * (Binary)
//!     ├── + (Binary)
//!     │   ├── width (Variable)
//!     │   └── 2 (Number)
//!     └── 3 (Number)
//! ```
//!
//! Syntax errors are collected instead of thrown. The parser substitutes a
//! placeholder or skips a token and keeps going, so one run reports as many
//! mistakes as it can find.

//! ## Semantic analysis
//!
//! Every name lives in one flat namespace for the whole program. A name must
//! be declared by `let` or by a `for` header before it is read. Declaring it
//! twice is allowed and only earns a warning.

//! ## Optimization
//!
//! The tree is rewritten by value. Binary nodes whose operands are known
//! integers are folded, and variables declared with a known integer are
//! propagated into the folds that read them.
//!
//! `let w = 4; let area = (w + 2) * 3;` => `let w = 4; let area = 18;`

//! ## Code generation
//!
//! One pass over the optimized tree emits instructions for a small stack
//! machine. Each variable gets a numbered slot. Control flow becomes jumps,
//! forward jumps are emitted first and patched when their target is known.

//! ## Execution
//!
//! The virtual machine fetches, decodes and executes until it runs off the end
//! of the program or meets `HALT`. `PRINT` appends to an output log. A fault
//! such as division by zero stops the run, and nothing it printed survives.

pub mod cli;
mod ast;
mod codegen;
mod compiler;
mod error;
mod optimizer;
mod parser;
mod scanner;
mod semantic;
mod vm;

pub use ast::{BinaryOperator, Expression, Program, Statement};
pub use codegen::{Bytecode, CodeGenerator, INSTRUCTION_WIDTH, Instruction, OpCode};
pub use compiler::{CompilationResult, Compiler};
pub use error::{
	CompileError,
	parser::{ParseError, ParseErrorType},
	semantic::{SemanticError, SemanticWarning},
	vm::RuntimeError,
};
pub use optimizer::{Optimization, OptimizationReport, Optimizer};
pub use parser::Parser;
pub use scanner::{Scanner, Token, TokenType, display_tokens};
pub use semantic::{SemanticAnalyzer, SemanticReport};
pub use vm::VirtualMachine;

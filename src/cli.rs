use std::path::PathBuf;

use palc::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tinyc", after_long_help = "A teaching compiler for a tiny integer language.")]
pub struct Cli {
	/// Print the structured (JSON) form instead of text
	#[arg(long)]
	pub json: bool,
	#[command(subcommand)]
	pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
	/// Print the token list
	Tokens { path: PathBuf },
	/// Print the syntax tree
	Ast { path: PathBuf },
	/// Print the semantic report
	Check { path: PathBuf },
	/// Print the optimization report
	Optimize { path: PathBuf },
	/// Print the bytecode listing
	Bytecode { path: PathBuf },
	/// Compile and run, printing the program output
	Run { path: PathBuf },
	/// Run every stage and print all artifacts
	Compile { path: PathBuf },
	/// Input prompt
	Repl,
}

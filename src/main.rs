use std::{path::Path, process::ExitCode};

use palc::Parser;
use serde::Serialize;
use tinyc::{Compiler, cli::*, display_tokens};
use tracing_forest::{ForestLayer, util::LevelFilter};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
	let env_filter = EnvFilter::builder().with_default_directive(LevelFilter::WARN.into()).from_env_lossy();
	Registry::default().with(env_filter).with(ForestLayer::default()).init();

	let cli = Cli::parse();
	let compiler = Compiler;

	let result = match cli.mode {
		Mode::Tokens { path } => read(&compiler, &path).and_then(|source| {
			let tokens = compiler.tokenize(&source);
			show(cli.json, &tokens, || format!("{}\n", display_tokens(&tokens)))
		}),
		Mode::Ast { path } => read(&compiler, &path).and_then(|source| {
			let program = compiler.parse(&source)?;
			show(cli.json, &program, || program.to_string())
		}),
		Mode::Check { path } => read(&compiler, &path).and_then(|source| {
			let report = compiler.analyze(&source)?;
			show(cli.json, &report, || report.to_string())
		}),
		Mode::Optimize { path } => read(&compiler, &path).and_then(|source| {
			let report = compiler.optimize(&source)?;
			show(cli.json, &report, || report.to_string())
		}),
		Mode::Bytecode { path } => read(&compiler, &path).and_then(|source| {
			let bytecode = compiler.generate(&source)?;
			show(cli.json, &bytecode, || bytecode.to_string())
		}),
		Mode::Run { path } => read(&compiler, &path).and_then(|source| {
			let output = compiler.run(&source)?;
			show(cli.json, &output, || output.iter().map(|value| format!("{value}\n")).collect())
		}),
		Mode::Compile { path } => read(&compiler, &path).and_then(|source| {
			let result = compiler.compile_and_run(&source);
			show(cli.json, &result, || result.to_string())?;
			if !result.success {
				anyhow::bail!("Compilation failed");
			}
			Ok(())
		}),
		Mode::Repl => {
			compiler.run_prompt();
			Ok(())
		}
	};

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{e:#}");
			ExitCode::FAILURE
		}
	}
}

fn read(compiler: &Compiler, path: &Path) -> anyhow::Result<String> { Ok(compiler.read_source(path)?) }

/// Print either the structured or the text form of an artifact.
fn show<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(value)?);
	} else {
		print!("{}", text());
	}
	Ok(())
}

use tinyc::{
	BinaryOperator, CodeGenerator, CompileError, Compiler, Expression, OpCode, Optimizer, Program, SemanticError,
	SemanticWarning, Statement, VirtualMachine,
};

/// Evaluate a straight-line program directly on the tree.
fn interpret(program: &Program) -> Vec<i64> {
	fn evaluate(expression: &Expression, variables: &std::collections::HashMap<String, i64>) -> i64 {
		match expression {
			Expression::Number { value } => *value,
			Expression::Variable { name } => variables.get(name).copied().unwrap_or_default(),
			Expression::Binary { operator, left, right } => {
				operator.apply(evaluate(left, variables), evaluate(right, variables)).unwrap()
			}
		}
	}

	let mut variables = std::collections::HashMap::new();
	let mut output = Vec::new();
	for statement in &program.statements {
		match statement {
			Statement::VarDecl { name, initializer } => {
				let value = evaluate(initializer, &variables);
				variables.insert(name.clone(), value);
			}
			Statement::Print { expression } => output.push(evaluate(expression, &variables)),
			_ => panic!("not a straight-line program"),
		}
	}
	output
}

#[test]
fn arithmetic_matches_integer_semantics() {
	let source = "print 1 + 2 * 3 - 4; print 17 / 5; print (0 - 17) / 5; print 17 / (0 - 5); print 6 * 7 == 42; print 2 \
	              < 1; print 100 / 7 * 7 + 100 - 100 / 7 * 7;";
	assert_eq!(Compiler.run(source).unwrap(), vec![3, 3, -3, -3, 1, 0, 100]);
}

#[test]
fn codegen_agrees_with_the_tree() {
	let sources = [
		"let a = 3; let b = a * a - 1; print b / 2; print a - b; let a = b + a; print a;",
		"let x = 10; let y = x / 3; print x - y * 3; print (x + y) * (x - y); print x > y; print y == 3;",
	];
	for source in sources {
		let program = Compiler.parse(source).unwrap();
		let expected = interpret(&program);

		let bytecode = CodeGenerator::new().generate(&program).unwrap();
		assert_eq!(VirtualMachine::new().execute(&bytecode).unwrap(), expected, "{source}");

		let optimized = Optimizer::new().optimize(program);
		let bytecode = CodeGenerator::new().generate(&optimized).unwrap();
		assert_eq!(VirtualMachine::new().execute_image(&bytecode.encode()).unwrap(), expected, "{source}");
	}
}

#[test]
fn optimizing_is_idempotent() {
	let program = Compiler.parse("let a = 6 * 7; let b = a - 2; print b / 4; for i = 1 to b { print i * a; }").unwrap();
	let mut optimizer = Optimizer::new();
	let folded = optimizer.optimize(program);
	assert!(optimizer.report().applied());

	let again = optimizer.optimize(folded.clone());
	assert_eq!(again, folded);
	assert!(optimizer.report().optimizations.is_empty());
	assert_eq!(optimizer.report().to_string(), "Optimization Report:\n  - No optimizations applied\n");
}

#[test]
fn loop_bounds() {
	assert_eq!(Compiler.run("for i = 1 to 3 { print i; }").unwrap(), vec![1, 2, 3]);
	assert_eq!(Compiler.run("for i = 5 to 3 { print i; }").unwrap(), Vec::<i64>::new());
}

#[test]
fn division_by_zero_fails_without_output() {
	let result = Compiler.compile_and_run("let x = 5 / 0; print x;");
	assert!(!result.success);
	assert!(result.output.is_empty());
	assert!(result.error.unwrap().starts_with("Execution error: Division by zero"));
}

#[test]
fn undefined_variable_never_reaches_codegen() {
	let result = Compiler.compile_and_run("print y;");
	assert!(!result.success);
	assert!(result.error.as_deref().unwrap().contains("'y'"));
	assert!(result.bytecode.is_none());
	assert!(result.output.is_empty());
	assert!(matches!(
		Compiler.generate("print y;"),
		Err(CompileError::SemanticErrors(errors)) if errors == vec![SemanticError::UndefinedVariable("y".to_string())]
	));
}

#[test]
fn constant_folding_feeds_a_single_push() {
	let result = Compiler.compile_and_run("let a = 2 + 3; print a;");
	let report = result.optimization.unwrap().to_string();
	assert!(report.contains("Constant folding: 2 + 3 = 5"), "{report}");

	let bytecode = result.bytecode.unwrap();
	let opcodes: Vec<OpCode> = bytecode.instructions().iter().map(|i| i.opcode).collect();
	assert!(!opcodes.contains(&OpCode::Add));
	assert_eq!(bytecode.instructions().iter().filter(|i| i.opcode == OpCode::Push).count(), 1);
	assert_eq!(bytecode.instructions()[0].operand, 5);
	assert_eq!(result.output, vec![5]);
}

#[test]
fn redeclaration_prints_latest_value() {
	let result = Compiler.compile_and_run("let a = 1; let a = 2; print a;");
	assert!(result.success);
	assert_eq!(result.output, vec![2]);
	let semantic = result.semantic.unwrap();
	assert!(semantic.errors.is_empty());
	assert_eq!(semantic.warnings, vec![SemanticWarning::Redeclared("a".to_string())]);
}

#[test]
fn loop_variable_outlives_the_loop() {
	assert_eq!(Compiler.run("for i = 1 to 4 { } print i;").unwrap(), vec![5]);
	assert_eq!(Compiler.run("for i = 7 to 4 { } print i;").unwrap(), vec![7]);
}

#[test]
fn operator_symbols() {
	let program = Compiler.parse("print 1 + 2 * 3;").unwrap();
	let Statement::Print { expression: Expression::Binary { operator, .. } } = &program.statements[0] else {
		panic!("expected a binary print");
	};
	assert_eq!(*operator, BinaryOperator::Add);
	assert_eq!(program.to_string(), "(print (+ 1 (* 2 3)))\n");
}

#[test]
fn deep_input_is_a_parse_error() {
	let chain = format!("print 1{};", " + 1".repeat(5000));
	let result = Compiler.compile_and_run(&chain);
	assert!(!result.success);
	assert!(result.ast.is_none());
	assert!(result.error.unwrap().contains("Expression nested too deeply"));
	assert!(matches!(Compiler.run(&chain), Err(CompileError::ParseErrors(_))));

	let variables = format!("let x = 1; print x{};", " + x".repeat(5000));
	assert!(matches!(Compiler.run(&variables), Err(CompileError::ParseErrors(_))));

	let parentheses = format!("print {}1{};", "(".repeat(20000), ")".repeat(20000));
	assert!(matches!(Compiler.parse(&parentheses), Err(CompileError::ParseErrors(errors)) if errors.len() == 1));
}

#[test]
fn long_legal_expressions_still_run() {
	assert_eq!(Compiler.run(&format!("print 1{};", " + 1".repeat(255))).unwrap(), vec![256]);
	assert_eq!(Compiler.run(&format!("let x = 2; print x{};", " * 1 - x + x".repeat(80))).unwrap(), vec![2]);
}

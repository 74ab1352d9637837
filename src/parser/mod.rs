//! The `Scanner` works on the lexical grammar, its alphabet is characters.
//! The `Parser` works on the syntactic grammar, its alphabet is tokens and
//! what it builds is a `Program`.
//!
//! |Name|Operators|Associates
//! --|--|--
//! Comparison|> < ==|None (at most one per expression)
//! Term|+ -|Left
//! Factor|* /|Left
//!
//! Grammar:
//!
//! ``` BNF
//! program        → statement* EOF ;
//! statement      → "let" IDENTIFIER "=" expression ";"
//!                | "print" expression ";"
//!                | "if" expression "{" block ( "else" "{" block )?
//!                | "for" IDENTIFIER "=" expression "to" expression "{" block
//!                | "{" block ;
//! block          → statement* "}" ;
//! expression     → comparison ;
//! comparison     → term ( ( ">" | "<" | "==" ) term )? ;
//! term           → factor ( ( "-" | "+" ) factor )* ;
//! factor         → primary ( ( "/" | "*" ) primary )* ;
//! primary        → NUMBER | IDENTIFIER | "(" expression ")" ;
//! ```
//!
//! Errors never stop the parse. A missing token is reported and parsing
//! continues as if it had been there, a missing expression becomes the
//! literal `0`, and a token that cannot start a statement is skipped. This
//! way one typo does not hide the mistakes after it.
//!
//! Every later pass walks the tree recursively, so the parser bounds it:
//! an expression deeper than `MAX_EXPRESSION_DEPTH` (operators or
//! parentheses) and blocks nested deeper than `MAX_BLOCK_DEPTH` are reported
//! and replaced by `0` and an empty block.

use TokenType::*;
use tracing::{debug, instrument};

use crate::{
	ast::{BinaryOperator, Expression, Program, Statement},
	error::parser::{ParseError, ParseErrorType},
	scanner::{Token, TokenType},
};

/// Deepest expression tree the parser builds.
pub const MAX_EXPRESSION_DEPTH: usize = 256;
/// Deepest nesting of blocks, `if` and `for` bodies included.
pub const MAX_BLOCK_DEPTH: usize = 256;

/// An expression and the depth of its tree.
type Parsed = (Expression, usize);

/// A recursive descent parser with one token of lookahead.
pub struct Parser<'a> {
	/// The tokens to parse, always terminated by `Eof`.
	tokens:      Vec<Token<'a>>,
	current:     usize,
	errors:      Vec<ParseError>,
	/// Open parentheses around the current expression.
	parentheses: usize,
	/// Open blocks around the current statement.
	blocks:      usize,
}

impl<'a> Parser<'a> {
	pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
		if tokens.last().is_none_or(|token| token.r#type != Eof) {
			let (line, column) = tokens.last().map_or((1, 1), |token| (token.line, token.column));
			tokens.push(Token::new(Eof, "", line, column));
		}
		Self { tokens, current: 0, errors: Vec::new(), parentheses: 0, blocks: 0 }
	}

	/// Parse the whole token stream. Check `has_errors` before trusting the
	/// result.
	#[instrument(name = "parse", skip_all)]
	pub fn parse(&mut self) -> Program {
		let mut statements = Vec::new();
		while !self.is_at_end() {
			match self.statement() {
				Some(statement) => statements.push(statement),
				None => {
					self.advance();
				}
			}
		}
		debug!(statements = statements.len(), errors = self.errors.len(), "parsed program");
		Program { statements }
	}

	pub fn has_errors(&self) -> bool { !self.errors.is_empty() }

	pub fn errors(&self) -> &[ParseError] { &self.errors }

	pub fn into_errors(self) -> Vec<ParseError> { self.errors }

	/// Parse one statement, `None` when no statement starts here.
	fn statement(&mut self) -> Option<Statement> {
		match self.peek().r#type {
			Let => {
				self.advance();
				Some(self.var_declaration())
			}
			Print => {
				self.advance();
				Some(self.print_statement())
			}
			If => {
				self.advance();
				Some(self.if_statement())
			}
			For => {
				self.advance();
				Some(self.for_statement())
			}
			LeftBrace => {
				self.advance();
				Some(self.block())
			}
			_ => {
				self.error(ParseErrorType::ExpectedStatement);
				None
			}
		}
	}

	fn var_declaration(&mut self) -> Statement {
		let name = self.consume(Identifier, "variable name").lexeme.to_string();
		self.consume(Equal, "'=' after variable name");
		let initializer = self.expression();
		self.consume(Semicolon, "';' after variable declaration");
		Statement::VarDecl { name, initializer }
	}

	fn print_statement(&mut self) -> Statement {
		let expression = self.expression();
		self.consume(Semicolon, "';' after print statement");
		Statement::Print { expression }
	}

	fn if_statement(&mut self) -> Statement {
		let condition = self.expression();
		self.consume(LeftBrace, "'{' after if condition");
		let then_branch = Box::new(self.block());

		let else_branch = if self.match_token(Else) {
			self.consume(LeftBrace, "'{' after else");
			Some(Box::new(self.block()))
		} else {
			None
		};
		Statement::If { condition, then_branch, else_branch }
	}

	fn for_statement(&mut self) -> Statement {
		let variable = self.consume(Identifier, "variable name in for loop").lexeme.to_string();
		self.consume(Equal, "'=' in for loop");
		let start = self.expression();
		self.consume(To, "'to' in for loop");
		let end = self.expression();
		self.consume(LeftBrace, "'{' after for loop header");
		let body = Box::new(self.block());
		Statement::For { variable, start, end, body }
	}

	/// Parse statements up to and including the closing brace. The opening
	/// brace has already been consumed.
	fn block(&mut self) -> Statement {
		if self.blocks >= MAX_BLOCK_DEPTH {
			self.error(ParseErrorType::BlockTooDeep);
			self.skip_nested(LeftBrace, RightBrace);
			return Statement::Block { statements: Vec::new() };
		}

		self.blocks += 1;
		let mut statements = Vec::new();
		while !self.check(RightBrace) && !self.is_at_end() {
			match self.statement() {
				Some(statement) => statements.push(statement),
				None => {
					self.advance();
				}
			}
		}
		self.blocks -= 1;
		self.consume(RightBrace, "'}' after block");
		Statement::Block { statements }
	}

	fn expression(&mut self) -> Expression { self.comparison().0 }

	/// A single, non-chainable comparison.
	fn comparison(&mut self) -> Parsed {
		let expression = self.term();
		let token = *self.peek();
		if let Some(operator) = self.match_operator(&[Greater, Less, EqualEqual]) {
			let right = self.term();
			return self.binary(expression, operator, right, &token);
		}
		expression
	}

	fn term(&mut self) -> Parsed {
		let mut expression = self.factor();
		let mut token = *self.peek();
		while let Some(operator) = self.match_operator(&[Plus, Minus]) {
			let right = self.factor();
			expression = self.binary(expression, operator, right, &token);
			token = *self.peek();
		}
		expression
	}

	fn factor(&mut self) -> Parsed {
		let mut expression = self.primary();
		let mut token = *self.peek();
		while let Some(operator) = self.match_operator(&[Star, Slash]) {
			let right = self.primary();
			expression = self.binary(expression, operator, right, &token);
			token = *self.peek();
		}
		expression
	}

	fn primary(&mut self) -> Parsed {
		let token = *self.peek();
		match token.r#type {
			Number => {
				self.advance();
				match token.lexeme.parse::<i64>() {
					Ok(value) => (Expression::number(value), 1),
					Err(_) => {
						self.error_at(&token, ParseErrorType::IntegerOutOfRange(token.lexeme.to_string()));
						(Expression::number(0), 1)
					}
				}
			}
			Identifier => {
				self.advance();
				(Expression::variable(token.lexeme), 1)
			}
			LeftParen => {
				self.advance();
				if self.parentheses >= MAX_EXPRESSION_DEPTH {
					self.error_at(&token, ParseErrorType::ExpressionTooDeep);
					self.skip_nested(LeftParen, RightParen);
					return (Expression::number(0), 1);
				}
				self.parentheses += 1;
				let expression = self.comparison();
				self.parentheses -= 1;
				self.consume(RightParen, "')' after expression");
				expression
			}
			_ => {
				self.error(ParseErrorType::ExpectedExpression);
				(Expression::number(0), 1)
			}
		}
	}

	/// Build `left operator right`, or report it at `at` and yield `0` when the
	/// tree would grow past `MAX_EXPRESSION_DEPTH`.
	fn binary(&mut self, left: Parsed, operator: BinaryOperator, right: Parsed, at: &Token<'a>) -> Parsed {
		let depth = 1 + left.1.max(right.1);
		if depth > MAX_EXPRESSION_DEPTH {
			self.error_at(at, ParseErrorType::ExpressionTooDeep);
			return (Expression::number(0), 1);
		}
		(Expression::binary(left.0, operator, right.0), depth)
	}

	/// Skip past the `close` matching an already consumed `open`, without
	/// descending into what lies between. Stops early at `;` for parentheses.
	fn skip_nested(&mut self, open: TokenType, close: TokenType) {
		let mut depth = 1;
		while !self.is_at_end() {
			let r#type = self.peek().r#type;
			if r#type == Semicolon && open == LeftParen {
				return;
			}
			self.advance();
			if r#type == open {
				depth += 1;
			} else if r#type == close {
				depth -= 1;
				if depth == 0 {
					return;
				}
			}
		}
	}

	/// Consume a binary operator from `types`, if the current token is one.
	fn match_operator(&mut self, types: &[TokenType]) -> Option<BinaryOperator> {
		let r#type = self.peek().r#type;
		if !types.contains(&r#type) {
			return None;
		}
		self.advance();
		BinaryOperator::from_token(r#type)
	}

	fn match_token(&mut self, r#type: TokenType) -> bool {
		if self.check(r#type) {
			self.advance();
			return true;
		}
		false
	}

	/// Consume the expected token. On a mismatch the error is recorded and the
	/// current token is returned without consuming it.
	fn consume(&mut self, r#type: TokenType, expected: &'static str) -> Token<'a> {
		if self.check(r#type) {
			return self.advance();
		}
		self.error(ParseErrorType::Expected(expected));
		*self.peek()
	}

	fn check(&self, r#type: TokenType) -> bool { !self.is_at_end() && self.peek().r#type == r#type }

	fn advance(&mut self) -> Token<'a> {
		let token = *self.peek();
		if !self.is_at_end() {
			self.current += 1;
		}
		token
	}

	fn is_at_end(&self) -> bool { self.peek().r#type == Eof }

	fn peek(&self) -> &Token<'a> { &self.tokens[self.current] }

	fn error(&mut self, r#type: ParseErrorType) {
		let token = *self.peek();
		self.error_at(&token, r#type);
	}

	fn error_at(&mut self, token: &Token<'a>, r#type: ParseErrorType) {
		let error = ParseError::new(token.line, token.column, r#type);
		debug!(%error, "syntax error");
		self.errors.push(error);
	}
}

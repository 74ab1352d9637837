use serde::Serialize;

/// A token produced by the scanner. The lexeme borrows from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
	#[serde(rename = "type")]
	pub r#type: TokenType,
	pub lexeme: &'a str,
	pub line:   usize,
	pub column: usize,
}

impl<'a> Token<'a> {
	pub fn new(r#type: TokenType, lexeme: &'a str, line: usize, column: usize) -> Self {
		Self { r#type, lexeme, line, column }
	}
}

impl std::fmt::Display for Token<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} '{}' {}:{}", self.r#type.name(), self.lexeme, self.line, self.column)
	}
}

/// The closed set of token kinds. Values are carried by the lexeme, the
/// parser converts number lexemes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
	/// Variable declaration keyword.
	Let,
	/// Print statement keyword.
	Print,
	/// If statement keyword.
	If,
	/// Else keyword.
	Else,
	/// For loop keyword.
	For,
	/// Loop bound keyword in `for i = 1 to 10`.
	To,
	/// Identifier, e.g. a variable name.
	Identifier,
	/// Integer literal, e.g. `123`.
	Number,
	/// Plus `+`.
	Plus,
	/// Minus `-`.
	Minus,
	/// Asterisk `*`.
	Star,
	/// Slash `/`.
	Slash,
	/// Assignment `=`.
	Equal,
	/// Equality `==`.
	EqualEqual,
	/// Greater than `>`.
	Greater,
	/// Less than `<`.
	Less,
	/// Semicolon `;`.
	Semicolon,
	/// Left brace `{`.
	LeftBrace,
	/// Right brace `}`.
	RightBrace,
	/// Left parenthesis `(`.
	LeftParen,
	/// Right parenthesis `)`.
	RightParen,
	/// End of input.
	Eof,
	/// Any character the language does not know.
	Invalid,
}

impl TokenType {
	pub fn keyword_or_identifier(value: &str) -> Self {
		match value {
			"let" => TokenType::Let,
			"print" => TokenType::Print,
			"if" => TokenType::If,
			"else" => TokenType::Else,
			"for" => TokenType::For,
			"to" => TokenType::To,
			_ => TokenType::Identifier,
		}
	}

	/// The upper-case name used in listings.
	pub fn name(self) -> &'static str {
		use TokenType::*;
		match self {
			Let => "LET",
			Print => "PRINT",
			If => "IF",
			Else => "ELSE",
			For => "FOR",
			To => "TO",
			Identifier => "IDENTIFIER",
			Number => "NUMBER",
			Plus => "PLUS",
			Minus => "MINUS",
			Star => "STAR",
			Slash => "SLASH",
			Equal => "EQUAL",
			EqualEqual => "EQUAL_EQUAL",
			Greater => "GREATER",
			Less => "LESS",
			Semicolon => "SEMICOLON",
			LeftBrace => "LEFT_BRACE",
			RightBrace => "RIGHT_BRACE",
			LeftParen => "LEFT_PAREN",
			RightParen => "RIGHT_PAREN",
			Eof => "EOF",
			Invalid => "INVALID",
		}
	}
}

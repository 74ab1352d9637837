//! Turns source text into tokens.
//!
//! The lexical grammar is small: six keywords, identifiers, unsigned integer
//! literals, eight operators and five delimiters. Whitespace and `//`
//! comments separate tokens and are dropped.
//!
//! Keywords are recognised after the whole identifier has been consumed
//! (`maximal munch`), so `letter` is an identifier and not `let` followed by
//! `ter`.
//!
//! The scanner never fails. A character outside the grammar becomes an
//! `Invalid` token and scanning goes on; the parser reports it when it gets
//! there. Every token records the 1-based line and column of its first
//! character, and the stream always ends with exactly one `Eof`.
mod token;

use std::{iter::Peekable, str::CharIndices};

use TokenType::*;
pub use token::*;
use tracing::{debug, instrument};

/// A scanner for tinyc source code
pub struct Scanner<'a> {
	/// User input source code
	source:      &'a str,
	/// User input source code iterator
	source_iter: Peekable<CharIndices<'a>>,
	/// Points at the beginning of the current lexeme
	start:       usize,
	/// Points just past the last consumed character
	cursor:      usize,
	/// Line of the next character
	line:        usize,
	/// Column of the next character
	column:      usize,
}

impl<'a> Scanner<'a> {
	pub fn new(source: &'a str) -> Self {
		let source_iter = source.char_indices().peekable();

		Self { source, source_iter, start: 0, cursor: 0, line: 1, column: 1 }
	}

	/// Scan all tokens from the source code
	#[instrument(name = "scan", skip_all)]
	pub fn scan_tokens(&mut self) -> Vec<Token<'a>> {
		let mut tokens = Vec::new();
		loop {
			self.skip_trivia();
			let Some(&(index, next_char)) = self.source_iter.peek() else { break };
			// We are at the beginning of the next lexeme.
			self.start = index;
			self.cursor = index;
			let (line, column) = (self.line, self.column);
			let r#type = self.scan_token(next_char);
			let lexeme = &self.source[self.start..self.cursor];
			if r#type == Invalid {
				debug!(line, column, lexeme, "unexpected character");
			}
			tokens.push(Token::new(r#type, lexeme, line, column));
		}
		tokens.push(Token::new(Eof, "", self.line, self.column));
		debug!(count = tokens.len(), "scanned tokens");
		tokens
	}

	/// Scan a single token starting with `next_char`
	fn scan_token(&mut self, next_char: char) -> TokenType {
		self.advance();
		#[rustfmt::skip]
		let r#type = match next_char {
			'(' => LeftParen,
			')' => RightParen,
			'{' => LeftBrace,
			'}' => RightBrace,
			';' => Semicolon,
			'+' => Plus,
			'-' => Minus,
			'*' => Star,
			'/' => Slash,
			'>' => Greater,
			'<' => Less,
			'=' => if self.match_next('=') { EqualEqual } else { Equal },
			c if c.is_ascii_digit() => self.number(),
			c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
			_ => Invalid,
		};
		r#type
	}

	/// Skip any run of whitespace and line comments
	fn skip_trivia(&mut self) {
		loop {
			match self.peek() {
				Some(c) if c.is_ascii_whitespace() => {
					self.advance();
				}
				Some('/') if self.peek_second() == Some('/') => {
					while self.peek().is_some_and(|c| c != '\n') {
						self.advance();
					}
				}
				_ => return,
			}
		}
	}

	/// Match the next character if it is the expected one
	fn match_next(&mut self, expected: char) -> bool {
		matches!(self.peek(), Some(c) if c == expected && { self.advance(); true })
	}

	/// Advance to the next character, keeping line and column in step
	fn advance(&mut self) -> Option<char> {
		let (i, c) = self.source_iter.next()?;
		self.cursor = i + c.len_utf8();
		if c == '\n' {
			self.line += 1;
			self.column = 1;
		} else {
			self.column += 1;
		}
		Some(c)
	}

	/// Peek the current character
	fn peek(&mut self) -> Option<char> { self.source_iter.peek().map(|&(_, c)| c) }

	/// Peek the second character ahead
	fn peek_second(&mut self) -> Option<char> {
		let mut it = self.source_iter.clone();
		it.next()?;
		it.peek().map(|&(_, c)| c)
	}

	/// Scan an integer literal, its value is parsed later
	fn number(&mut self) -> TokenType {
		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.advance();
		}
		Number
	}

	/// Scan an identifier or keyword
	fn identifier(&mut self) -> TokenType {
		while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
			self.advance();
		}
		let text = &self.source[self.start..self.cursor];
		TokenType::keyword_or_identifier(text)
	}
}

/// Render tokens as a bracketed, comma separated list.
pub fn display_tokens(tokens: &[Token]) -> String {
	format!("[{}]", tokens.iter().map(|t| t.to_string()).collect::<Vec<String>>().join(", "))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn types(input: &str) -> Vec<TokenType> { Scanner::new(input).scan_tokens().iter().map(|t| t.r#type).collect() }

	fn positions(input: &str) -> Vec<(usize, usize)> {
		Scanner::new(input).scan_tokens().iter().map(|t| (t.line, t.column)).collect()
	}

	#[test]
	fn scan_empty() {
		assert_eq!(types(""), vec![Eof]);
		assert_eq!(types("   \t\r\n "), vec![Eof]);
	}

	#[test]
	fn scan_keywords() {
		assert_eq!(types("let print if else for to"), vec![Let, Print, If, Else, For, To, Eof]);
	}

	#[test]
	fn scan_identifiers() {
		assert_eq!(types("x"), vec![Identifier, Eof]);
		assert_eq!(types("_name"), vec![Identifier, Eof]);
		assert_eq!(types("letter"), vec![Identifier, Eof]);
		assert_eq!(types("to2"), vec![Identifier, Eof]);
		assert_eq!(types("snake_case CamelCase"), vec![Identifier, Identifier, Eof]);
	}

	#[test]
	fn scan_operators() {
		assert_eq!(types("+ - * / = == > <"), vec![
			Plus, Minus, Star, Slash, Equal, EqualEqual, Greater, Less, Eof
		]);
		assert_eq!(types("; { } ( )"), vec![Semicolon, LeftBrace, RightBrace, LeftParen, RightParen, Eof]);
		assert_eq!(types("==="), vec![EqualEqual, Equal, Eof]);
	}

	#[test]
	fn scan_numbers() {
		let tokens = Scanner::new("0 42 123456789012345678901234567890").scan_tokens();
		assert_eq!(tokens[0].lexeme, "0");
		assert_eq!(tokens[1].lexeme, "42");
		assert_eq!(tokens[2].r#type, Number);
		assert_eq!(tokens[2].lexeme, "123456789012345678901234567890");
		assert_eq!(types("12ab"), vec![Number, Identifier, Eof]);
	}

	#[test]
	fn scan_comments() {
		assert_eq!(types("// only a comment"), vec![Eof]);
		assert_eq!(types("print 1; // trailing\nprint 2;"), vec![
			Print, Number, Semicolon, Print, Number, Semicolon, Eof
		]);
		assert_eq!(types("// one\n// two\n  \n// three\nlet"), vec![Let, Eof]);
		assert_eq!(types("4 / 2"), vec![Number, Slash, Number, Eof]);
	}

	#[test]
	fn scan_invalid_characters() {
		assert_eq!(types("@"), vec![Invalid, Eof]);
		assert_eq!(types("let x = 1 # 2;"), vec![Let, Identifier, Equal, Number, Invalid, Number, Semicolon, Eof]);
		let tokens = Scanner::new("你好").scan_tokens();
		assert_eq!(tokens.len(), 3);
		assert_eq!(tokens[0].lexeme, "你");
		assert_eq!(tokens[1].lexeme, "好");
	}

	#[test]
	fn scan_positions() {
		assert_eq!(positions("let x = 10;"), vec![(1, 1), (1, 5), (1, 7), (1, 9), (1, 11), (1, 12)]);
		assert_eq!(positions("print a;\n  print b;"), vec![(1, 1), (1, 7), (1, 8), (2, 3), (2, 9), (2, 10), (2, 11)]);
	}

	#[test]
	fn scan_eof_position() {
		let tokens = Scanner::new("a\nbc").scan_tokens();
		let eof = tokens.last().unwrap();
		assert_eq!(eof.r#type, Eof);
		assert_eq!((eof.line, eof.column), (2, 3));
	}

	#[test]
	fn display_token_list() {
		let tokens = Scanner::new("print 1;").scan_tokens();
		assert_eq!(display_tokens(&tokens), "[PRINT 'print' 1:1, NUMBER '1' 1:7, SEMICOLON ';' 1:8, EOF '' 1:9]");
	}
}

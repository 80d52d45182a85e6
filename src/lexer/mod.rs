use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Classes of tokens produced by the [`Lexer`].
///
/// `Identifier`, `Integer` and `StringLit` are the built-in token classes
/// that a grammar can reference through the special terminals `identifier`,
/// `integerConstant` and `stringLiteral`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    /// `[A-Za-z_][A-Za-z0-9_]*`, not present in the keyword alphabet.
    Identifier,
    /// `[0-9]+`
    Integer,
    /// A double-quoted string, without line breaks.
    StringLit,
    /// An identifier present in the keyword alphabet of the grammar.
    Keyword,
    /// An operator or punctuation symbol of the grammar.
    Symbol,
    /// End of the input.
    Eof,
}

/// A single token of the input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub ty: TokenType,
    /// Token text. Strings are stored without the surrounding quotes.
    pub text: String,
    /// 1-based line of the first character.
    pub line: u32,
    /// 1-based column of the first character.
    pub column: u32,
}

impl Token {
    /// Short description of the token used in error messages.
    pub fn describe(&self) -> String {
        format!("{:?}({})", self.ty, self.text)
    }
}

/// Lexical analyzer for the input text of a derived parser.
///
/// The keyword and symbol alphabets are not fixed: they are collected from
/// the grammar, so the same lexer runtime serves every grammar. Symbols may
/// span multiple characters (`==`, `<=`, `->`) and are matched longest
/// first.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    keywords: BTreeSet<String>,
    // sorted by decreasing length so the longest symbol matches first
    symbols: Vec<String>,
}

impl Lexer {
    /// Creates a new Lexer over `text` with the given keyword and symbol
    /// alphabets.
    pub fn new(text: &str, keywords: &BTreeSet<String>, symbols: &BTreeSet<String>) -> Lexer {
        let mut symbols = symbols.iter().cloned().collect::<Vec<_>>();
        symbols.sort_by_key(|sym| std::cmp::Reverse(sym.chars().count()));
        Lexer {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            keywords: keywords.clone(),
            symbols,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        if self.current() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.current().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    /// Skips a `//` or `/* */` comment. The cursor must be on the leading
    /// `/` and the next character decides the kind.
    fn skip_comment(&mut self) -> Result<(), ParseError> {
        let line = self.line;
        let column = self.column;
        if self.peek() == Some('/') {
            while self.current().is_some() && self.current() != Some('\n') {
                self.advance();
            }
            Ok(())
        } else {
            self.advance(); // `/`
            self.advance(); // `*`
            while let Some(c) = self.current() {
                if c == '*' && self.peek() == Some('/') {
                    self.advance();
                    self.advance();
                    return Ok(());
                }
                self.advance();
            }
            Err(ParseError::TokenizationError {
                message: format!(
                    "unterminated block comment starting at line {}, column {}",
                    line, column
                ),
            })
        }
    }

    fn identifier(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let ty = if self.keywords.contains(&text) {
            TokenType::Keyword
        } else {
            TokenType::Identifier
        };
        Token {
            ty,
            text,
            line,
            column,
        }
    }

    fn number(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token {
            ty: TokenType::Integer,
            text,
            line,
            column,
        }
    }

    fn string(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let column = self.column;
        self.advance(); // opening quote
        let mut text = String::new();
        while let Some(c) = self.current() {
            match c {
                '"' => {
                    self.advance();
                    return Ok(Token {
                        ty: TokenType::StringLit,
                        text,
                        line,
                        column,
                    });
                }
                '\n' => {
                    return Err(ParseError::TokenizationError {
                        message: format!(
                            "line break inside string literal starting at line {}, column {}",
                            line, column
                        ),
                    })
                }
                _ => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        Err(ParseError::TokenizationError {
            message: format!(
                "unterminated string literal starting at line {}, column {}",
                line, column
            ),
        })
    }

    /// Matches the longest symbol of the alphabet at the cursor.
    fn symbol(&mut self) -> Option<Token> {
        let line = self.line;
        let column = self.column;
        let matched = self
            .symbols
            .iter()
            .find(|sym| {
                sym.chars()
                    .enumerate()
                    .all(|(off, c)| self.chars.get(self.pos + off) == Some(&c))
            })
            .cloned();
        matched.map(|text| {
            for _ in 0..text.chars().count() {
                self.advance();
            }
            Token {
                ty: TokenType::Symbol,
                text,
                line,
                column,
            }
        })
    }

    /// Returns the next token of the input.
    ///
    /// After the input is exhausted every call returns an
    /// [`TokenType::Eof`] token.
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.skip_whitespace();
                continue;
            }
            if c == '/' && matches!(self.peek(), Some('/') | Some('*')) {
                self.skip_comment()?;
                continue;
            }
            if c.is_alphabetic() || c == '_' {
                return Ok(self.identifier());
            }
            if c.is_ascii_digit() {
                return Ok(self.number());
            }
            if c == '"' {
                return self.string();
            }
            if let Some(token) = self.symbol() {
                return Ok(token);
            }
            return Err(ParseError::TokenizationError {
                message: format!(
                    "illegal symbol `{}` at line {}, column {}",
                    c, self.line, self.column
                ),
            });
        }
        Ok(Token {
            ty: TokenType::Eof,
            text: String::new(),
            line: self.line,
            column: self.column,
        })
    }

    /// Collects every token of the input, ending with the
    /// [`TokenType::Eof`] token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let eof = token.ty == TokenType::Eof;
            tokens.push(token);
            if eof {
                return Ok(tokens);
            }
        }
    }
}

/// Tokenizes a string with the given keyword and symbol alphabets.
/// # Examples
/// Basic usage:
/// ```
/// use std::collections::BTreeSet;
/// use takin::lexer::{tokenize_string, TokenType};
///
/// let keywords = ["let"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
/// let symbols = ["=", ";"].iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
/// let tokens = tokenize_string("let x = 3;", &keywords, &symbols).unwrap();
///
/// assert_eq!(tokens.len(), 6);
/// assert_eq!(tokens[0].ty, TokenType::Keyword);
/// assert_eq!(tokens[1].ty, TokenType::Identifier);
/// assert_eq!(tokens[5].ty, TokenType::Eof);
/// ```
pub fn tokenize_string(
    text: &str,
    keywords: &BTreeSet<String>,
    symbols: &BTreeSet<String>,
) -> Result<Vec<Token>, ParseError> {
    Lexer::new(text, keywords, symbols).tokenize()
}

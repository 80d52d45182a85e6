use super::{Expr, Rule};
use crate::error::{caret_message, ParseError};

/// Tokens of the EBNF notation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Tok {
    /// A rule name, `[A-Za-z_][A-Za-z0-9_-]*`.
    Ident,
    /// A quoted terminal, single or double quotes, backslash escapes.
    Literal,
    /// `=`
    Equals,
    /// `;`
    Semi,
    /// `,`
    Comma,
    /// `|`
    Bar,
    /// `(`
    LPar,
    /// `)`
    RPar,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `*`
    Star,
    /// `+`
    Plus,
    /// `?`
    Question,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    /// Token text. Literals are stored without quotes and with escapes resolved.
    text: String,
    line: u32,
    column: u32,
}

/// Character-walking lexer for the EBNF notation, tracking lines and columns.
struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Lexer<'a> {
        Lexer {
            source: text,
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
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

    fn identifier(&mut self) -> Token {
        let line = self.line;
        let column = self.column;
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token {
            tok: Tok::Ident,
            text,
            line,
            column,
        }
    }

    fn literal(&mut self, quote: char) -> Result<Token, ParseError> {
        let line = self.line;
        let column = self.column;
        self.advance();
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c == quote {
                self.advance();
                return Ok(Token {
                    tok: Tok::Literal,
                    text,
                    line,
                    column,
                });
            } else if c == '\\' {
                self.advance();
                if let Some(escaped) = self.current() {
                    text.push(escaped);
                    self.advance();
                }
            } else {
                text.push(c);
                self.advance();
            }
        }
        Err(ParseError::SyntaxError {
            message: format!(
                "unterminated literal {}",
                caret_message(
                    self.source,
                    line,
                    column,
                    "end of input",
                    &format!("closing `{}`", quote),
                )
            ),
        })
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }
            if c == '#' {
                while self.current().is_some() && self.current() != Some('\n') {
                    self.advance();
                }
                continue;
            }
            if c.is_alphabetic() || c == '_' {
                return Ok(self.identifier());
            }
            if c == '"' || c == '\'' {
                return self.literal(c);
            }
            let tok = match c {
                '=' => Tok::Equals,
                ';' => Tok::Semi,
                ',' => Tok::Comma,
                '|' => Tok::Bar,
                '(' => Tok::LPar,
                ')' => Tok::RPar,
                '{' => Tok::LBrace,
                '}' => Tok::RBrace,
                '[' => Tok::LBracket,
                ']' => Tok::RBracket,
                '*' => Tok::Star,
                '+' => Tok::Plus,
                '?' => Tok::Question,
                _ => {
                    return Err(ParseError::SyntaxError {
                        message: caret_message(
                            self.source,
                            self.line,
                            self.column,
                            &format!("`{}`", c),
                            "a token of the EBNF notation",
                        ),
                    })
                }
            };
            let token = Token {
                tok,
                text: c.to_string(),
                line: self.line,
                column: self.column,
            };
            self.advance();
            return Ok(token);
        }
        Ok(Token {
            tok: Tok::Eof,
            text: String::new(),
            line: self.line,
            column: self.column,
        })
    }
}

/// Parses a grammar written in the EBNF notation into its rules.
pub(super) fn parse(content: &str) -> Result<Vec<Rule>, ParseError> {
    Parser::new(content)?.parse_grammar()
}

/// Recursive descent parser for the EBNF notation.
struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Result<Parser<'a>, ParseError> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Parser {
            source,
            lexer,
            current,
        })
    }

    fn error(&self, expected: &str) -> ParseError {
        let got = format!("{:?}({})", self.current.tok, self.current.text);
        ParseError::SyntaxError {
            message: caret_message(
                self.source,
                self.current.line,
                self.current.column,
                &got,
                expected,
            ),
        }
    }

    /// Consumes the current token if it matches, errors otherwise.
    fn eat(&mut self, tok: Tok, expected: &str) -> Result<Token, ParseError> {
        if self.current.tok == tok {
            let next = self.lexer.next_token()?;
            Ok(std::mem::replace(&mut self.current, next))
        } else {
            Err(self.error(expected))
        }
    }

    // grammar: rule* EOF
    fn parse_grammar(&mut self) -> Result<Vec<Rule>, ParseError> {
        let mut rules = Vec::new();
        while self.current.tok != Tok::Eof {
            rules.push(self.parse_rule()?);
        }
        Ok(rules)
    }

    // rule: IDENT `=` expression `;`
    fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        let head = self.eat(Tok::Ident, "rule name")?;
        self.eat(Tok::Equals, "`=`")?;
        let body = self.parse_expression()?;
        self.eat(Tok::Semi, "`;`")?;
        Ok(Rule {
            head: head.text,
            body,
        })
    }

    // expression: sequence (`|` sequence)*
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_sequence()?;
        if self.current.tok != Tok::Bar {
            return Ok(first);
        }
        let mut options = vec![first];
        while self.current.tok == Tok::Bar {
            self.eat(Tok::Bar, "`|`")?;
            options.push(self.parse_sequence()?);
        }
        Ok(Expr::Alternative(options))
    }

    // sequence: term (`,` term)*
    fn parse_sequence(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_term()?;
        if self.current.tok != Tok::Comma {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.current.tok == Tok::Comma {
            self.eat(Tok::Comma, "`,`")?;
            items.push(self.parse_term()?);
        }
        Ok(Expr::Sequence(items))
    }

    // term: (LITERAL | IDENT | `(` expression `)`) [`*` | `+` | `?`]
    //     | `{` expression `}`
    //     | `[` expression `]`
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let term = match self.current.tok {
            Tok::Literal => {
                let literal = self.eat(Tok::Literal, "literal")?;
                if literal.text.is_empty() {
                    Expr::Empty
                } else {
                    Expr::Terminal(literal.text)
                }
            }
            Tok::Ident => {
                let name = self.eat(Tok::Ident, "identifier")?;
                Expr::NonTerminal(name.text)
            }
            Tok::LPar => {
                self.eat(Tok::LPar, "`(`")?;
                let inner = self.parse_expression()?;
                self.eat(Tok::RPar, "`)`")?;
                inner
            }
            Tok::LBrace => {
                self.eat(Tok::LBrace, "`{`")?;
                let inner = self.parse_expression()?;
                self.eat(Tok::RBrace, "`}`")?;
                return Ok(Expr::Repetition(Box::new(inner)));
            }
            Tok::LBracket => {
                self.eat(Tok::LBracket, "`[`")?;
                let inner = self.parse_expression()?;
                self.eat(Tok::RBracket, "`]`")?;
                return Ok(Expr::Optional(Box::new(inner)));
            }
            _ => return Err(self.error("term")),
        };
        match self.current.tok {
            Tok::Star => {
                self.eat(Tok::Star, "`*`")?;
                Ok(Expr::Repetition(Box::new(term)))
            }
            Tok::Plus => {
                // x+ is desugared to x , {x}
                self.eat(Tok::Plus, "`+`")?;
                let repeated = Expr::Repetition(Box::new(term.clone()));
                Ok(Expr::Sequence(vec![term, repeated]))
            }
            Tok::Question => {
                self.eat(Tok::Question, "`?`")?;
                Ok(Expr::Optional(Box::new(term)))
            }
            _ => Ok(term),
        }
    }
}

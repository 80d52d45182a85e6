use super::{Expr, Rule};
use crate::error::{caret_message, ParseError};

/// Tokens of the BNF notation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Tok {
    /// A nonterminal written `<name>`.
    Ident,
    /// A terminal quoted with `"`.
    Literal,
    /// `=` or `::=`
    Equals,
    /// `;`
    Semi,
    /// `|`
    Bar,
    /// `(`
    LPar,
    /// `)`
    RPar,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    text: String,
    line: u32,
    column: u32,
}

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

    /// Reads a nonterminal enclosed in angle brackets. The brackets are not
    /// part of the token text.
    fn identifier(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let column = self.column;
        self.advance(); // skip `<`
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c == '>' {
                self.advance();
                return Ok(Token {
                    tok: Tok::Ident,
                    text,
                    line,
                    column,
                });
            }
            text.push(c);
            self.advance();
        }
        Err(ParseError::SyntaxError {
            message: format!(
                "unterminated nonterminal {}",
                caret_message(self.source, line, column, "end of input", "closing `>`")
            ),
        })
    }

    /// Reads a terminal enclosed in double quotes.
    fn literal(&mut self) -> Result<Token, ParseError> {
        let line = self.line;
        let column = self.column;
        self.advance(); // skip opening quote
        let mut text = String::new();
        while let Some(c) = self.current() {
            if c == '"' {
                self.advance();
                return Ok(Token {
                    tok: Tok::Literal,
                    text,
                    line,
                    column,
                });
            }
            text.push(c);
            self.advance();
        }
        Err(ParseError::SyntaxError {
            message: format!(
                "unterminated literal {}",
                caret_message(self.source, line, column, "end of input", "closing `\"`")
            ),
        })
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        while let Some(c) = self.current() {
            if c.is_whitespace() {
                self.advance();
                continue;
            }
            match c {
                '<' => return self.identifier(),
                '"' => return self.literal(),
                ':' => {
                    // only the `::=` spelling is legal
                    let line = self.line;
                    let column = self.column;
                    self.advance();
                    if self.current() == Some(':') {
                        self.advance();
                        if self.current() == Some('=') {
                            self.advance();
                            return Ok(Token {
                                tok: Tok::Equals,
                                text: "::=".to_string(),
                                line,
                                column,
                            });
                        }
                    }
                    return Err(ParseError::SyntaxError {
                        message: caret_message(self.source, line, column, "`:`", "`::=`"),
                    });
                }
                '=' | ';' | '|' | '(' | ')' => {
                    let tok = match c {
                        '=' => Tok::Equals,
                        ';' => Tok::Semi,
                        '|' => Tok::Bar,
                        '(' => Tok::LPar,
                        _ => Tok::RPar,
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
                _ => {
                    return Err(ParseError::SyntaxError {
                        message: caret_message(
                            self.source,
                            self.line,
                            self.column,
                            &format!("`{}`", c),
                            "a token of the BNF notation",
                        ),
                    })
                }
            }
        }
        Ok(Token {
            tok: Tok::Eof,
            text: String::new(),
            line: self.line,
            column: self.column,
        })
    }
}

/// Parses a grammar written in the BNF notation into its rules.
pub(super) fn parse(content: &str) -> Result<Vec<Rule>, ParseError> {
    Parser::new(content)?.parse_grammar()
}

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

    // rule: IDENT (`=` | `::=`) expression `;`
    fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        let head = self.eat(Tok::Ident, "rule name")?;
        self.eat(Tok::Equals, "`=` or `::=`")?;
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

    // sequence: term+, terms are juxtaposed without separators
    fn parse_sequence(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_term()?;
        if !matches!(self.current.tok, Tok::Ident | Tok::Literal | Tok::LPar) {
            return Ok(first);
        }
        let mut items = vec![first];
        while matches!(self.current.tok, Tok::Ident | Tok::Literal | Tok::LPar) {
            items.push(self.parse_term()?);
        }
        Ok(Expr::Sequence(items))
    }

    // term: LITERAL | IDENT | `(` expression `)`
    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        match self.current.tok {
            Tok::Literal => {
                let literal = self.eat(Tok::Literal, "literal")?;
                if literal.text.is_empty() {
                    Ok(Expr::Empty)
                } else {
                    Ok(Expr::Terminal(literal.text))
                }
            }
            Tok::Ident => {
                let name = self.eat(Tok::Ident, "identifier")?;
                Ok(Expr::NonTerminal(name.text))
            }
            Tok::LPar => {
                self.eat(Tok::LPar, "`(`")?;
                let inner = self.parse_expression()?;
                self.eat(Tok::RPar, "`)`")?;
                Ok(inner)
            }
            _ => Err(self.error("term")),
        }
    }
}

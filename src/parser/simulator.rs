use super::conversion::{CompiledExpr, CompiledGrammar};
use crate::error::{caret_message, ParseError};
use crate::lexer::{tokenize_string, Token, TokenType};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Backtracking recognizer driving a [`CompiledGrammar`] over the input.
///
/// The recognizer tokenizes the input with the alphabets collected from the
/// grammar and then matches the start rule against the token stream. Every
/// (rule, position) outcome is memoized, so the backtracking never evaluates
/// the same rule at the same position twice.
///
/// Failures are reported at the furthest position the match reached,
/// together with the offending token and a caret-marked source line. Sync
/// points can be configured to check where parsing could resume after an
/// error.
pub struct Recognizer<'a> {
    grammar: &'a CompiledGrammar,
    sync_points: BTreeSet<String>,
}

impl<'a> Recognizer<'a> {
    /// Creates a new Recognizer for the given compiled grammar.
    pub fn new(grammar: &'a CompiledGrammar) -> Recognizer<'a> {
        Recognizer {
            grammar,
            sync_points: BTreeSet::new(),
        }
    }

    /// Configures the token texts acting as error recovery sync points.
    ///
    /// When a recognition error is reported, the error message states
    /// whether a sync point is reachable after the failure and on which
    /// line, as a hint on where parsing could resume.
    pub fn with_sync_points<I>(mut self, points: I) -> Recognizer<'a>
    where
        I: IntoIterator<Item = String>,
    {
        self.sync_points = points.into_iter().collect();
        self
    }

    /// Checks that the whole input belongs to the language of the grammar.
    /// # Examples
    /// Basic usage:
    /// ```
    /// use takin::grammar::Grammar;
    /// use takin::parser::{CompiledGrammar, Recognizer};
    ///
    /// let g = "assignment = identifier, \"=\", integerConstant, \";\" ;";
    /// let grammar = Grammar::parse_ebnf_string(g).unwrap();
    /// let compiled = CompiledGrammar::compile(&grammar).unwrap();
    /// let recognizer = Recognizer::new(&compiled);
    ///
    /// assert!(recognizer.parse("x = 3;").is_ok());
    /// assert!(recognizer.parse("x = ;").is_err());
    /// ```
    pub fn parse(&self, input: &str) -> Result<(), ParseError> {
        let tokens = tokenize_string(input, self.grammar.keywords(), self.grammar.symbols())?;
        let mut run = Run {
            grammar: self.grammar,
            tokens: &tokens,
            pos: 0,
            furthest: 0,
            memo: FxHashMap::default(),
        };
        if !run.parse_rule(0) {
            let expected = format!("valid {}", self.grammar.start_rule());
            return Err(self.recognition_error(input, &run, &expected));
        }
        if run.tokens[run.pos].ty != TokenType::Eof {
            run.furthest = run.furthest.max(run.pos);
            return Err(self.recognition_error(input, &run, "end of input"));
        }
        Ok(())
    }

    fn recognition_error(&self, source: &str, run: &Run, expected: &str) -> ParseError {
        let token = &run.tokens[run.furthest.min(run.tokens.len() - 1)];
        let got = if token.ty == TokenType::Eof {
            "end of input".to_string()
        } else {
            token.describe()
        };
        let mut message = caret_message(source, token.line, token.column, &got, expected);
        if !self.sync_points.is_empty() {
            let sync = run.tokens[run.furthest.min(run.tokens.len() - 1)..]
                .iter()
                .find(|t| self.sync_points.contains(&t.text));
            match sync {
                Some(point) => message.push_str(&format!(
                    "\nParsing can resume at sync point `{}` on line {}",
                    point.text, point.line
                )),
                None => message.push_str("\nNo sync point reachable after the error"),
            }
        }
        ParseError::RecognitionError { message }
    }
}

/// State of a single recognition run.
struct Run<'t> {
    grammar: &'t CompiledGrammar,
    /// Token stream, always terminated by an Eof token.
    tokens: &'t [Token],
    pos: usize,
    /// Highest position reached by any match attempt, for error reporting.
    furthest: usize,
    /// Packrat cache, (rule, position) to (outcome, end position).
    memo: FxHashMap<(u32, usize), (bool, usize)>,
}

impl Run<'_> {
    fn parse_rule(&mut self, rule: u32) -> bool {
        let key = (rule, self.pos);
        if let Some(&(matched, end)) = self.memo.get(&key) {
            if matched {
                self.pos = end;
            }
            return matched;
        }
        let start = self.pos;
        // seed the cache with a failure so left-recursive rules fail
        // instead of recursing forever
        self.memo.insert(key, (false, start));
        let grammar = self.grammar;
        let matched = self.parse_expr(&grammar.rule(rule).body);
        if !matched {
            self.pos = start;
        }
        self.memo.insert(key, (matched, self.pos));
        matched
    }

    fn parse_expr(&mut self, node: &CompiledExpr) -> bool {
        match node {
            CompiledExpr::Keyword(text) => self.match_token(TokenType::Keyword, Some(text)),
            CompiledExpr::Symbol(text) => self.match_token(TokenType::Symbol, Some(text)),
            CompiledExpr::Special(special) => self.match_token(special.token_type(), None),
            CompiledExpr::NonTerminal(rule) => self.parse_rule(*rule),
            CompiledExpr::Sequence(items) => {
                let start = self.pos;
                for item in items {
                    if !self.parse_expr(item) {
                        self.pos = start;
                        return false;
                    }
                }
                true
            }
            CompiledExpr::Alternative(options) => {
                let start = self.pos;
                for option in options {
                    if self.parse_expr(option) {
                        return true;
                    }
                    self.pos = start;
                }
                false
            }
            CompiledExpr::Repetition(inner) => {
                loop {
                    let start = self.pos;
                    if !self.parse_expr(inner) {
                        self.pos = start;
                        break;
                    }
                    // stop on empty matches or the repetition never ends
                    if self.pos == start {
                        break;
                    }
                }
                true
            }
            CompiledExpr::Optional(inner) => {
                let start = self.pos;
                if !self.parse_expr(inner) {
                    self.pos = start;
                }
                true
            }
            CompiledExpr::Empty => true,
        }
    }

    /// Matches the current token against a class and optionally its text,
    /// advancing on success. The furthest position is updated either way.
    fn match_token(&mut self, ty: TokenType, text: Option<&str>) -> bool {
        let token = &self.tokens[self.pos];
        let matched = token.ty == ty && text.map_or(true, |t| token.text == t);
        if matched {
            self.pos += 1;
        }
        self.furthest = self.furthest.max(self.pos);
        matched
    }
}

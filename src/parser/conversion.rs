use super::SpecialToken;
use crate::error::ParseError;
use crate::grammar::{Expr, Grammar, Rule};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A production body with every name resolved.
///
/// Nonterminal references are rule indices, terminals are split into
/// keywords, symbols and built-in token classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum CompiledExpr {
    /// An alphabetic terminal, matched against a keyword token.
    Keyword(String),
    /// An operator or punctuation terminal, matched against a symbol token.
    Symbol(String),
    /// A built-in token class.
    Special(SpecialToken),
    /// A reference to the rule with this index.
    NonTerminal(u32),
    Sequence(Vec<CompiledExpr>),
    Alternative(Vec<CompiledExpr>),
    Repetition(Box<CompiledExpr>),
    Optional(Box<CompiledExpr>),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CompiledRule {
    pub(crate) head: String,
    pub(crate) body: CompiledExpr,
}

/// A grammar compiled into the form executed by the
/// [`Recognizer`](super::Recognizer).
///
/// Compiling resolves every nonterminal reference to a rule index, collects
/// the keyword and symbol alphabets handed to the lexer, folds the
/// `number`/`digit` rule pair into the built-in `integerConstant` class and
/// derives the operator precedence table. The result is serializable, so the
/// tables can be stored and loaded without the grammar text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledGrammar {
    rules: Vec<CompiledRule>,
    keywords: BTreeSet<String>,
    symbols: BTreeSet<String>,
    precedence: FxHashMap<String, u32>,
}

impl CompiledGrammar {
    /// Compiles a grammar.
    ///
    /// References to nonterminals that are neither defined by the grammar
    /// nor built-in token classes are reported as
    /// [`ParseError::InvalidGrammar`].
    /// # Examples
    /// Basic usage:
    /// ```
    /// use takin::grammar::Grammar;
    /// use takin::parser::CompiledGrammar;
    ///
    /// let g = "assignment = identifier, \"=\", integerConstant, \";\" ;";
    /// let grammar = Grammar::parse_ebnf_string(g).unwrap();
    /// let compiled = CompiledGrammar::compile(&grammar).unwrap();
    ///
    /// assert_eq!(compiled.start_rule(), "assignment");
    /// assert!(compiled.symbols().contains("="));
    /// ```
    pub fn compile(grammar: &Grammar) -> Result<CompiledGrammar, ParseError> {
        let mut rules = grammar.iter().cloned().collect::<Vec<_>>();
        fold_number_rule(&mut rules);
        let names = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| (rule.head.clone(), index as u32))
            .collect::<FxHashMap<_, _>>();
        let mut keywords = BTreeSet::new();
        let mut symbols = BTreeSet::new();
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in &rules {
            let body = lower(&rule.body, &rule.head, &names, &mut keywords, &mut symbols)?;
            compiled.push(CompiledRule {
                head: rule.head.clone(),
                body,
            });
        }
        let precedence = precedence_levels(&rules);
        Ok(CompiledGrammar {
            rules: compiled,
            keywords,
            symbols,
            precedence,
        })
    }

    /// Returns the number of compiled rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Checks if the compiled grammar has no rules. Always false for
    /// grammars built by this crate.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the head of the start rule.
    pub fn start_rule(&self) -> &str {
        &self.rules[0].head
    }

    /// Returns the keyword alphabet collected from the grammar.
    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    /// Returns the symbol alphabet collected from the grammar.
    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    /// Returns the precedence level of an operator, if the grammar assigns
    /// one.
    ///
    /// Rules whose head ends in `Expression` assign their operator
    /// terminals to successive levels, in grammar order: operators of the
    /// first such rule get level 0, operators of the second level 1 and so
    /// on.
    /// # Examples
    /// Basic usage:
    /// ```
    /// use takin::grammar::Grammar;
    /// use takin::parser::CompiledGrammar;
    ///
    /// let g = "additiveExpression = term, {(\"+\" | \"-\"), term} ;
    ///          term = multiplicativeExpression ;
    ///          multiplicativeExpression = integerConstant, {(\"*\" | \"/\"), integerConstant} ;";
    /// let grammar = Grammar::parse_ebnf_string(g).unwrap();
    /// let compiled = CompiledGrammar::compile(&grammar).unwrap();
    ///
    /// assert_eq!(compiled.precedence_of("+"), Some(0));
    /// assert_eq!(compiled.precedence_of("*"), Some(1));
    /// assert_eq!(compiled.precedence_of("&"), None);
    /// ```
    pub fn precedence_of(&self, operator: &str) -> Option<u32> {
        self.precedence.get(operator).copied()
    }

    pub(crate) fn rule(&self, index: u32) -> &CompiledRule {
        &self.rules[index as usize]
    }
}

/// Detects the textbook `number = digit, {digit} ;` rule pair and folds it
/// into the built-in `integerConstant` token class: the lexer already
/// groups digit runs into a single integer token, so matching them digit by
/// digit would never succeed.
fn fold_number_rule(rules: &mut Vec<Rule>) {
    let has_digit = rules.iter().any(|rule| rule.head == "digit");
    let folds = rules
        .iter()
        .find(|rule| rule.head == "number")
        .map_or(false, |rule| is_digit_sequence(&rule.body));
    if !has_digit || !folds {
        return;
    }
    rules.retain(|rule| rule.head != "number" && rule.head != "digit");
    for rule in rules.iter_mut() {
        replace_number(&mut rule.body);
    }
}

/// Checks if a body matches `digit` or `digit, {digit}`.
fn is_digit_sequence(body: &Expr) -> bool {
    let digit = Expr::NonTerminal("digit".to_string());
    match body {
        Expr::NonTerminal(name) => name == "digit",
        Expr::Sequence(items) => match items.as_slice() {
            [first] => *first == digit,
            [first, Expr::Repetition(inner)] => *first == digit && **inner == digit,
            _ => false,
        },
        _ => false,
    }
}

fn replace_number(node: &mut Expr) {
    match node {
        Expr::NonTerminal(name) if name == "number" => {
            *node = Expr::Terminal("integerConstant".to_string());
        }
        Expr::Sequence(items) | Expr::Alternative(items) => {
            items.iter_mut().for_each(replace_number);
        }
        Expr::Repetition(inner) | Expr::Optional(inner) => replace_number(inner),
        _ => (),
    }
}

/// Resolves names and classifies terminals, growing the keyword and symbol
/// alphabets along the way.
fn lower(
    node: &Expr,
    head: &str,
    names: &FxHashMap<String, u32>,
    keywords: &mut BTreeSet<String>,
    symbols: &mut BTreeSet<String>,
) -> Result<CompiledExpr, ParseError> {
    match node {
        Expr::Terminal(text) => {
            if let Some(special) = SpecialToken::from_name(text) {
                Ok(CompiledExpr::Special(special))
            } else if text.chars().all(|c| c.is_alphabetic()) {
                keywords.insert(text.clone());
                Ok(CompiledExpr::Keyword(text.clone()))
            } else {
                // digit terminals are left out of the symbol alphabet, the
                // lexer groups digits into integer tokens
                if !text.chars().all(|c| c.is_ascii_digit()) {
                    symbols.insert(text.clone());
                }
                Ok(CompiledExpr::Symbol(text.clone()))
            }
        }
        Expr::NonTerminal(name) => {
            // a rule defined by the grammar shadows the built-in classes
            if let Some(&index) = names.get(name) {
                Ok(CompiledExpr::NonTerminal(index))
            } else if let Some(special) = SpecialToken::from_name(name) {
                Ok(CompiledExpr::Special(special))
            } else {
                Err(ParseError::InvalidGrammar {
                    message: format!(
                        "rule `{}` references undefined nonterminal `{}`",
                        head, name
                    ),
                })
            }
        }
        Expr::Sequence(items) => {
            let items = items
                .iter()
                .map(|item| lower(item, head, names, keywords, symbols))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CompiledExpr::Sequence(items))
        }
        Expr::Alternative(options) => {
            let options = options
                .iter()
                .map(|option| lower(option, head, names, keywords, symbols))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(CompiledExpr::Alternative(options))
        }
        Expr::Repetition(inner) => Ok(CompiledExpr::Repetition(Box::new(lower(
            inner, head, names, keywords, symbols,
        )?))),
        Expr::Optional(inner) => Ok(CompiledExpr::Optional(Box::new(lower(
            inner, head, names, keywords, symbols,
        )?))),
        Expr::Empty => Ok(CompiledExpr::Empty),
    }
}

/// Assigns precedence levels to the operators of `*Expression` rules.
///
/// Every rule whose head ends in `Expression` opens a new level; its
/// non-alphabetic terminals are the operators of that level.
fn precedence_levels(rules: &[Rule]) -> FxHashMap<String, u32> {
    let mut precedence = FxHashMap::default();
    let mut level = 0;
    for rule in rules {
        if rule.head.ends_with("Expression") {
            for operator in extract_operators(&rule.body) {
                precedence.insert(operator, level);
            }
            level += 1;
        }
    }
    precedence
}

fn extract_operators(node: &Expr) -> Vec<String> {
    let mut operators = Vec::new();
    match node {
        // keyword operators are excluded, only symbols carry precedence
        Expr::Terminal(text) => {
            if !text.chars().all(|c| c.is_alphabetic()) {
                operators.push(text.clone());
            }
        }
        Expr::Sequence(items) | Expr::Alternative(items) => {
            for item in items {
                operators.extend(extract_operators(item));
            }
        }
        Expr::Repetition(inner) | Expr::Optional(inner) => {
            operators.extend(extract_operators(inner));
        }
        _ => (),
    }
    operators
}

#[cfg(test)]
mod tests {
    use super::{CompiledExpr, CompiledGrammar};
    use crate::error::ParseError;
    use crate::grammar::Grammar;
    use crate::parser::SpecialToken;
    use maplit::btreeset;

    const ARITHMETIC: &str = "expr = term, {(\"+\" | \"-\"), term} ;
        term = factor, {(\"*\" | \"/\"), factor} ;
        factor = number | \"(\", expr, \")\" ;
        number = digit, {digit} ;
        digit = \"0\" | \"1\" | \"2\" | \"3\" | \"4\" | \"5\" | \"6\" | \"7\" | \"8\" | \"9\" ;";

    #[test]
    fn compile_collects_alphabets() {
        let g = "statement = \"let\" | \"if\", \"(\", \")\" ;";
        let grammar = Grammar::parse_ebnf_string(g).unwrap();
        let compiled = CompiledGrammar::compile(&grammar).unwrap();
        assert_eq!(
            *compiled.keywords(),
            btreeset! {"let".to_string(), "if".to_string()}
        );
        assert_eq!(
            *compiled.symbols(),
            btreeset! {"(".to_string(), ")".to_string()}
        );
    }

    #[test]
    fn compile_folds_number_rule() {
        let grammar = Grammar::parse_ebnf_string(ARITHMETIC).unwrap();
        let compiled = CompiledGrammar::compile(&grammar).unwrap();
        // number and digit disappear, factor references integerConstant
        assert_eq!(compiled.len(), 3);
        match &compiled.rule(2).body {
            CompiledExpr::Alternative(options) => {
                assert_eq!(
                    options[0],
                    CompiledExpr::Special(SpecialToken::IntegerConstant)
                );
            }
            other => panic!("unexpected body {:?}", other),
        }
        // the folded digits never reach the symbol alphabet
        assert!(!compiled.symbols().contains("0"));
        assert!(compiled.symbols().contains("+"));
    }

    #[test]
    fn compile_keeps_unrelated_number_rule() {
        // a number rule that is not a digit sequence is left alone
        let g = "expr = number ;
                 number = \"x\" ;
                 digit = \"0\" ;";
        let grammar = Grammar::parse_ebnf_string(g).unwrap();
        let compiled = CompiledGrammar::compile(&grammar).unwrap();
        assert_eq!(compiled.len(), 3);
    }

    #[test]
    fn compile_special_tokens() {
        let g = "value = identifier | integerConstant | stringLiteral ;";
        let grammar = Grammar::parse_ebnf_string(g).unwrap();
        let compiled = CompiledGrammar::compile(&grammar).unwrap();
        let expected = CompiledExpr::Alternative(vec![
            CompiledExpr::Special(SpecialToken::Identifier),
            CompiledExpr::Special(SpecialToken::IntegerConstant),
            CompiledExpr::Special(SpecialToken::StringLiteral),
        ]);
        assert_eq!(compiled.rule(0).body, expected);
        assert!(compiled.keywords().is_empty());
    }

    #[test]
    fn compile_defined_rule_shadows_special() {
        let g = "value = identifier ;
                 identifier = \"a\" ;";
        let grammar = Grammar::parse_ebnf_string(g).unwrap();
        let compiled = CompiledGrammar::compile(&grammar).unwrap();
        assert_eq!(compiled.rule(0).body, CompiledExpr::NonTerminal(1));
    }

    #[test]
    fn compile_undefined_nonterminal() {
        let g = "expr = missing ;";
        let grammar = Grammar::parse_ebnf_string(g).unwrap();
        let err = CompiledGrammar::compile(&grammar).unwrap_err();
        match err {
            ParseError::InvalidGrammar { message } => {
                assert!(message.contains("missing"));
                assert!(message.contains("expr"));
            }
            _ => panic!("wrong error type"),
        }
    }

    #[test]
    fn precedence_levels_follow_rule_order() {
        let g = "orExpression = andExpression, {\"|\", andExpression} ;
                 andExpression = relationalExpression, {\"&\", relationalExpression} ;
                 relationalExpression = identifier, {(\"<\" | \">\"), identifier} ;";
        let grammar = Grammar::parse_ebnf_string(g).unwrap();
        let compiled = CompiledGrammar::compile(&grammar).unwrap();
        assert_eq!(compiled.precedence_of("|"), Some(0));
        assert_eq!(compiled.precedence_of("&"), Some(1));
        assert_eq!(compiled.precedence_of("<"), Some(2));
        assert_eq!(compiled.precedence_of(">"), Some(2));
        assert_eq!(compiled.precedence_of("+"), None);
    }

    #[test]
    fn precedence_ignores_keywords() {
        let g = "unaryExpression = (\"-\" | \"not\"), identifier ;";
        let grammar = Grammar::parse_ebnf_string(g).unwrap();
        let compiled = CompiledGrammar::compile(&grammar).unwrap();
        assert_eq!(compiled.precedence_of("-"), Some(0));
        assert_eq!(compiled.precedence_of("not"), None);
    }

    #[test]
    fn compiled_grammar_serde_roundtrip() {
        let grammar = Grammar::parse_ebnf_string(ARITHMETIC).unwrap();
        let compiled = CompiledGrammar::compile(&grammar).unwrap();
        let json = serde_json::to_string(&compiled).unwrap();
        let restored: CompiledGrammar = serde_json::from_str(&json).unwrap();
        assert_eq!(compiled, restored);
    }
}

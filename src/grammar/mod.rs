use crate::error::ParseError;
use rustc_hash::FxHashMap;
use std::ops::Index;

/// Hand-written parser for the BNF notation.
mod bnf;
/// Textual converter rewriting BNF grammars into the EBNF notation.
mod convert;
/// Hand-written parser for the EBNF notation.
mod ebnf;

pub use self::convert::convert_bnf;

/// A single element of a production body.
///
/// Bodies are trees: the leaves are terminals, nonterminal references or the
/// empty production, the inner nodes combine their children. `Repetition`
/// means zero or more, the one-or-more postfix `+` of the EBNF notation is
/// desugared to `x , {x}` while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A literal token, for example `"while"` or `"+"`.
    Terminal(String),
    /// A reference to another rule by name.
    NonTerminal(String),
    /// All the children must match, in order.
    Sequence(Vec<Expr>),
    /// Exactly one of the children must match.
    Alternative(Vec<Expr>),
    /// The child may match any number of times, including zero.
    Repetition(Box<Expr>),
    /// The child may match once or not at all.
    Optional(Box<Expr>),
    /// The empty production, always matches.
    Empty,
}

/// A named production in the form `head = body ;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub head: String,
    pub body: Expr,
}

/// Struct representing a parsed grammar.
///
/// This struct stores the productions in the form `head = body ;` in their
/// original order and allows to access every `body` given a particular
/// `head`. The first rule of the grammar is the start rule.
pub struct Grammar {
    // productions in the order they appear in the grammar text
    rules: Vec<Rule>,
    // map assigning an index in `rules` to the productions' heads
    names: FxHashMap<String, usize>,
}

impl Grammar {
    /// Constructs a new Grammar from a list of rules.
    ///
    /// An empty rule list or two rules sharing the same head are rejected
    /// with [`ParseError::InvalidGrammar`]. References to undefined
    /// nonterminals are legal at this point: they are diagnosed while
    /// compiling the grammar, as some of them name built-in token classes.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Grammar, ParseError> {
        if rules.is_empty() {
            return Err(ParseError::InvalidGrammar {
                message: "the grammar contains no rules".to_string(),
            });
        }
        let mut names = FxHashMap::default();
        for (index, rule) in rules.iter().enumerate() {
            if names.insert(rule.head.clone(), index).is_some() {
                return Err(ParseError::InvalidGrammar {
                    message: format!("duplicated rule `{}`", rule.head),
                });
            }
        }
        Ok(Grammar { rules, names })
    }

    /// Returns the total number of productions.
    /// # Examples
    /// Basic usage:
    /// ```
    /// let g = "word = letter, {letter} ;
    ///          letter = \"a\" | \"b\" ;";
    /// let grammar = takin::grammar::Grammar::parse_ebnf_string(g).unwrap();
    /// assert_eq!(grammar.len(), 2);
    /// ```
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Checks if the grammar has no productions.
    ///
    /// Always false for grammars built by this crate, as empty grammars are
    /// rejected during construction.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the production body associated to a given head.
    ///
    /// Productions are expressed in the form `head = body ;`. This method
    /// takes the `head` and returns the given `body` or None if the
    /// production does not exists.
    /// # Examples
    /// Basic usage:
    /// ```
    /// use takin::grammar::{Expr, Grammar};
    ///
    /// let grammar = Grammar::parse_ebnf_string("letter = \"a\" ;").unwrap();
    /// let body = grammar.get("letter").unwrap();
    /// assert_eq!(*body, Expr::Terminal("a".to_string()));
    /// ```
    pub fn get(&self, head: &str) -> Option<&Expr> {
        self.names.get(head).map(|&index| &self.rules[index].body)
    }

    /// Returns the index of the rule with the given head, if any.
    pub fn index_of(&self, head: &str) -> Option<usize> {
        self.names.get(head).copied()
    }

    /// Returns the start rule of the grammar.
    ///
    /// The start rule is the first rule appearing in the grammar text.
    pub fn start(&self) -> &Rule {
        &self.rules[0]
    }

    /// Returns an iterator over the rules, in grammar order.
    pub fn iter(&self) -> std::slice::Iter<Rule> {
        self.rules.iter()
    }

    /// Builds a grammar from a file using the EBNF notation.
    ///
    /// This method constructs and initializes a Grammar by parsing an
    /// external description written in the EBNF notation.
    ///
    /// In case the file cannot be found or contains syntax errors a
    /// ParseError is returned.
    /// # Examples
    /// Basic usage:
    /// ```no_run
    /// let grammar = takin::grammar::Grammar::parse_ebnf("jack.ebnf").unwrap();
    /// ```
    pub fn parse_ebnf(path: &str) -> Result<Grammar, ParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_ebnf_string(&content)
    }

    /// Builds a grammar from a String using the EBNF notation.
    ///
    /// Rules take the form `name = expression ;`. Alternatives are separated
    /// by `|`, the elements of a sequence by `,`. `{ }` or a postfix `*`
    /// repeat an element zero or more times, a postfix `+` repeats it at
    /// least once, `[ ]` or a postfix `?` make it optional and `( )` groups.
    /// Terminals are quoted with `'` or `"`, `#` starts a line comment.
    ///
    /// A ParseError is returned in case the String contains syntax errors.
    /// # Examples
    /// Basic usage:
    /// ```
    /// let g = "expr = term, {(\"+\" | \"-\"), term} ;
    ///          term = \"x\" ;";
    /// let grammar = takin::grammar::Grammar::parse_ebnf_string(g).unwrap();
    /// assert_eq!(grammar.start().head, "expr");
    /// ```
    pub fn parse_ebnf_string(content: &str) -> Result<Grammar, ParseError> {
        let rules = ebnf::parse(content)?;
        Self::from_rules(rules)
    }

    /// Builds a grammar from a String using the BNF notation.
    ///
    /// Nonterminals are written `<name>`, terminals are quoted with `"`,
    /// rules are assigned with `=` or `::=` and terminated by `;`.
    /// Sequences are expressed by juxtaposition, without separators.
    /// # Examples
    /// Basic usage:
    /// ```
    /// let g = "<digits> ::= <digits> \"0\" | \"1\" ;";
    /// let grammar = takin::grammar::Grammar::parse_bnf_string(g).unwrap();
    /// assert_eq!(grammar.len(), 1);
    /// ```
    pub fn parse_bnf_string(content: &str) -> Result<Grammar, ParseError> {
        let rules = bnf::parse(content)?;
        Self::from_rules(rules)
    }
}

impl Index<usize> for Grammar {
    type Output = Rule;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rules[index]
    }
}

#[cfg(test)]
mod tests {
    use super::{Expr, Grammar, Rule};

    #[test]
    fn grammar_duplicated_rule() {
        let rules = vec![
            Rule {
                head: "a".to_string(),
                body: Expr::Terminal("x".to_string()),
            },
            Rule {
                head: "a".to_string(),
                body: Expr::Terminal("y".to_string()),
            },
        ];
        assert!(Grammar::from_rules(rules).is_err());
    }

    #[test]
    fn grammar_empty() {
        assert!(Grammar::from_rules(Vec::new()).is_err());
    }

    #[test]
    fn grammar_lookup() {
        let g = "expr = term ;
                 term = \"x\" ;";
        let grammar = Grammar::parse_ebnf_string(g).unwrap();
        assert_eq!(grammar.len(), 2);
        assert!(!grammar.is_empty());
        assert_eq!(grammar.index_of("term"), Some(1));
        assert_eq!(grammar.get("missing"), None);
        assert_eq!(grammar[1].head, "term");
    }
}

use regex::Regex;

/// C operators and punctuation that must be quoted to survive as terminals
/// in the EBNF notation. Longest first, so multi-character operators win
/// over their prefixes while scanning.
const C_SYMBOLS: [&str; 31] = [
    "<<=", ">>=", "...", "++", "--", "->", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "+", "-", "*", "/", "%", "<", ">", "&", "^",
];

/// A lexical item of a converted rule body, used to rebuild the rule with
/// the separators the EBNF notation requires.
enum Item {
    /// A rule reference or a quoted terminal, already in its final spelling.
    Atom(String),
    /// `{`, `[` or `(`.
    Open(char),
    /// `}`, `]` or `)`.
    Close(char),
    /// `|`
    Bar,
}

/// Converts a grammar written in the BNF notation into the EBNF notation.
///
/// Rules take the form `<head> ::= body`, possibly spanning multiple lines;
/// a new rule starts at the next `<head> ::=` line. Blank lines and `#`
/// comments are dropped. The conversion:
/// * removes the angle brackets and strips hyphens from rule names and
///   references;
/// * rewrites `{x}*` to `{ x }`, `{x}+` to `x { x }` and `{x}?` to `[ x ]`;
/// * quotes bare words and bare operator or punctuation symbols, so they
///   become terminals; only angle-bracketed names survive as rule
///   references. Multi-character operators such as `<<=` are matched
///   before their prefixes;
/// * inserts the commas separating the elements of a sequence and appends
///   the terminating `;`.
///
/// The output is accepted by
/// [`Grammar::parse_ebnf_string`](super::Grammar::parse_ebnf_string).
/// # Examples
/// Basic usage:
/// ```
/// let bnf = "<unary-expression> ::= <postfix-expression>
///                                 | ++ <unary-expression>";
/// let ebnf = takin::grammar::convert_bnf(bnf);
/// assert_eq!(
///     ebnf,
///     "unaryexpression = postfixexpression | \"++\", unaryexpression ;"
/// );
/// ```
pub fn convert_bnf(bnf: &str) -> String {
    let mut rules = Vec::new();
    let mut current: Option<String> = None;
    for line in bnf.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('<') && line.contains("::=") {
            if let Some(rule) = current.take() {
                rules.push(process_rule(&rule));
            }
            current = Some(line.to_string());
        } else if let Some(rule) = current.as_mut() {
            rule.push(' ');
            rule.push_str(line);
        }
    }
    if let Some(rule) = current.take() {
        rules.push(process_rule(&rule));
    }
    rules.join("\n")
}

fn process_rule(rule: &str) -> String {
    let (head, body) = match rule.split_once("::=") {
        Some(parts) => parts,
        None => return String::new(),
    };
    let head = head
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .replace('-', "");
    // repetition markers, the optional one first so `}?` is not eaten by `}`
    let optional = Regex::new(r"\{([^{}]+)\}\s*\?").expect("hardcoded regex");
    let body = optional.replace_all(body, "[ $1 ]");
    let one_or_more = Regex::new(r"\{([^{}]+)\}\s*\+").expect("hardcoded regex");
    let body = one_or_more.replace_all(&body, "$1 { $1 }");
    let zero_or_more = Regex::new(r"\{([^{}]+)\}\s*\*").expect("hardcoded regex");
    let body = zero_or_more.replace_all(&body, "{ $1 }");
    format!("{} = {} ;", head, join_items(&scan_items(&body)))
}

/// Matches a `<name>` reference at `pos`, returning the hyphen-stripped
/// name and the number of characters consumed. A `<` not followed by a
/// bracketed name is an operator, not a reference.
fn nonterminal_at(chars: &[char], pos: usize) -> Option<(String, usize)> {
    let mut name = String::new();
    let mut offset = pos + 1;
    while let Some(&c) = chars.get(offset) {
        if c == '>' {
            return if name.is_empty() {
                None
            } else {
                Some((name.replace('-', ""), offset + 1 - pos))
            };
        }
        if !c.is_alphanumeric() && c != '_' && c != '-' {
            return None;
        }
        name.push(c);
        offset += 1;
    }
    None
}

/// Splits a rewritten rule body into items, quoting the bare words and
/// symbols.
fn scan_items(body: &str) -> Vec<Item> {
    let chars = body.chars().collect::<Vec<_>>();
    let mut items = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        if c == '<' {
            if let Some((name, consumed)) = nonterminal_at(&chars, pos) {
                items.push(Item::Atom(name));
                pos += consumed;
                continue;
            }
        }
        if c == '"' {
            // already quoted, protect the content from symbol quoting
            let mut literal = String::new();
            pos += 1;
            while pos < chars.len() && chars[pos] != '"' {
                literal.push(chars[pos]);
                pos += 1;
            }
            pos += 1;
            items.push(Item::Atom(format!("\"{}\"", literal)));
        } else if c.is_alphanumeric() || c == '_' {
            // a bare word is a terminal of the described language
            let mut word = String::new();
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                word.push(chars[pos]);
                pos += 1;
            }
            items.push(Item::Atom(format!("\"{}\"", word)));
        } else if c == '{' || c == '[' {
            items.push(Item::Open(c));
            pos += 1;
        } else if c == '}' || c == ']' {
            items.push(Item::Close(c));
            pos += 1;
        } else if c == '|' {
            items.push(Item::Bar);
            pos += 1;
        } else {
            let matched = C_SYMBOLS
                .iter()
                .find(|sym| chars[pos..].starts_with(&sym.chars().collect::<Vec<_>>()[..]));
            let symbol = match matched {
                Some(sym) => sym.to_string(),
                None => c.to_string(),
            };
            pos += symbol.chars().count();
            items.push(Item::Atom(format!("\"{}\"", symbol)));
        }
    }
    items
}

/// Rebuilds a rule body from its items, adding the sequence commas.
fn join_items(items: &[Item]) -> String {
    let mut out = String::new();
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            let no_comma = matches!(items[idx - 1], Item::Bar | Item::Open(_))
                || matches!(item, Item::Bar | Item::Close(_));
            out.push_str(if no_comma { " " } else { ", " });
        }
        match item {
            Item::Atom(text) => out.push_str(text),
            Item::Open(c) | Item::Close(c) => out.push(*c),
            Item::Bar => out.push('|'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::convert_bnf;
    use crate::grammar::Grammar;
    use crate::parser::{CompiledGrammar, Recognizer};

    #[test]
    fn convert_single_rule() {
        let bnf = "<struct-or-union> ::= struct | union";
        assert_eq!(
            convert_bnf(bnf),
            "structorunion = \"struct\" | \"union\" ;"
        );
    }

    #[test]
    fn convert_continuation_lines() {
        let bnf = "<external-declaration> ::= <function-definition>
                                            | <declaration>";
        assert_eq!(
            convert_bnf(bnf),
            "externaldeclaration = functiondefinition | declaration ;"
        );
    }

    #[test]
    fn convert_repetitions() {
        let bnf = "<translation-unit> ::= {<external-declaration>}*";
        assert_eq!(convert_bnf(bnf), "translationunit = { externaldeclaration } ;");
        let bnf = "<declaration> ::= {<declaration-specifier>}+ ;";
        assert_eq!(
            convert_bnf(bnf),
            "declaration = declarationspecifier, { declarationspecifier }, \";\" ;"
        );
        let bnf = "<declarator> ::= {<pointer>}? <direct-declarator>";
        assert_eq!(
            convert_bnf(bnf),
            "declarator = [ pointer ], directdeclarator ;"
        );
    }

    #[test]
    fn convert_quotes_operators_longest_first() {
        let bnf = "<shift-expression> ::= <additive-expression>
                                        | <shift-expression> << <additive-expression>";
        assert_eq!(
            convert_bnf(bnf),
            "shiftexpression = additiveexpression | shiftexpression, \"<<\", additiveexpression ;"
        );
    }

    #[test]
    fn convert_quotes_bare_words() {
        // bare words are terminals, only `<name>` references a rule
        let bnf = "<type-specifier> ::= int | long | <typedef-name>";
        assert_eq!(
            convert_bnf(bnf),
            "typespecifier = \"int\" | \"long\" | typedefname ;"
        );
    }

    #[test]
    fn convert_skips_comments_and_blanks() {
        let bnf = "# a comment

                   <a-rule> ::= word";
        assert_eq!(convert_bnf(bnf), "arule = \"word\" ;");
    }

    #[test]
    fn convert_output_parses_as_ebnf() {
        let bnf = "<pointer> ::= * {<type-qualifier>}* {<pointer>}?
                   <type-qualifier> ::= const | volatile";
        let ebnf = convert_bnf(bnf);
        let grammar = Grammar::parse_ebnf_string(&ebnf).unwrap();
        assert_eq!(grammar.len(), 2);
        assert_eq!(grammar.start().head, "pointer");
    }

    #[test]
    fn convert_output_compiles_and_recognizes() {
        let bnf = "<pointer> ::= * {<type-qualifier>}* {<pointer>}?
                   <type-qualifier> ::= const | volatile";
        let grammar = Grammar::parse_ebnf_string(&convert_bnf(bnf)).unwrap();
        let compiled = CompiledGrammar::compile(&grammar).unwrap();
        assert!(compiled.keywords().contains("const"));
        assert!(compiled.symbols().contains("*"));
        let recognizer = Recognizer::new(&compiled);
        assert!(recognizer.parse("* const volatile *").is_ok());
        assert!(recognizer.parse("const *").is_err());
    }
}

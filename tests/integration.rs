use takin::error::ParseError;
use takin::grammar::{convert_bnf, Grammar};
use takin::parser::{CompiledGrammar, Recognizer};

const ARITHMETIC_GRAMMAR: &str = include_str!("../resources/arithmetic.ebnf");
const JACK_GRAMMAR: &str = include_str!("../resources/jack.ebnf");
const JACK_PROGRAM: &str = include_str!("../resources/Main.jack");
const DECLARATIONS_BNF: &str = include_str!("../resources/declarations.bnf");

fn compile(ebnf: &str) -> Result<CompiledGrammar, ParseError> {
    let grammar = Grammar::parse_ebnf_string(ebnf)?;
    CompiledGrammar::compile(&grammar)
}

#[test]
fn recognize_arithmetic_expressions() -> Result<(), ParseError> {
    let compiled = compile(ARITHMETIC_GRAMMAR)?;
    let recognizer = Recognizer::new(&compiled);
    recognizer.parse("12 + 3 * (40 - 5)")?;
    recognizer.parse("((((1))))")?;
    assert!(recognizer.parse("12 + ").is_err());
    assert!(recognizer.parse("12 3").is_err());
    Ok(())
}

#[test]
fn arithmetic_alphabet_comes_from_the_grammar() -> Result<(), ParseError> {
    let compiled = compile(ARITHMETIC_GRAMMAR)?;
    assert!(compiled.keywords().is_empty());
    let symbols = compiled.symbols();
    assert!(symbols.contains("+"));
    assert!(symbols.contains("("));
    // single digits are matched by the integer class, not as symbols
    assert!(!symbols.contains("0"));
    Ok(())
}

#[test]
fn arithmetic_operator_precedence() -> Result<(), ParseError> {
    let grammar = Grammar::parse_ebnf_string(
        "additiveExpression = multiplicativeExpression,
                              {(\"+\" | \"-\"), multiplicativeExpression} ;
         multiplicativeExpression = integerConstant,
                                    {(\"*\" | \"/\"), integerConstant} ;",
    )?;
    let compiled = CompiledGrammar::compile(&grammar)?;
    assert_eq!(compiled.precedence_of("+"), Some(0));
    assert_eq!(compiled.precedence_of("*"), Some(1));
    assert_eq!(compiled.precedence_of("("), None);
    Ok(())
}

#[test]
fn recognize_jack_program() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    Recognizer::new(&compiled).parse(JACK_PROGRAM)
}

#[test]
fn jack_alphabet() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    assert!(compiled.keywords().contains("class"));
    assert!(compiled.keywords().contains("while"));
    assert!(!compiled.keywords().contains("Main"));
    assert!(compiled.symbols().contains("~"));
    assert_eq!(compiled.start_rule(), "class");
    Ok(())
}

#[test]
fn jack_rejects_keyword_as_identifier() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    let recognizer = Recognizer::new(&compiled);
    // `class` is in the keyword alphabet, the class name must be an identifier
    assert!(recognizer.parse("class class { }").is_err());
    recognizer.parse("class Empty { }")
}

#[test]
fn jack_error_position_and_context() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    let recognizer = Recognizer::new(&compiled);
    let program = "class Main {
    function void main() {
        let = 3;
        return;
    }
}";
    let err = recognizer.parse(program).unwrap_err();
    match err {
        ParseError::RecognitionError { message } => {
            assert!(message.contains("line 3"));
            assert!(message.contains("let = 3;"));
            assert!(message.contains('^'));
        }
        _ => panic!("wrong error type"),
    }
    Ok(())
}

#[test]
fn jack_sync_point_hint() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    let recognizer =
        Recognizer::new(&compiled).with_sync_points([";".to_string(), "}".to_string()]);
    let program = "class Main {
    function void main() {
        let 3 = x;
        return;
    }
}";
    let err = recognizer.parse(program).unwrap_err();
    match err {
        ParseError::RecognitionError { message } => {
            assert!(message.contains("sync point `;`"));
            assert!(message.contains("line 3"));
        }
        _ => panic!("wrong error type"),
    }
    Ok(())
}

#[test]
fn jack_illegal_symbol() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    let err = Recognizer::new(&compiled)
        .parse("class Main { static int a#b; }")
        .unwrap_err();
    match err {
        ParseError::TokenizationError { message } => assert!(message.contains('#')),
        _ => panic!("wrong error type"),
    }
    Ok(())
}

#[test]
fn jack_unterminated_string() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    let err = Recognizer::new(&compiled)
        .parse("class Main { function void main() { do Output.printString(\"oops); } }")
        .unwrap_err();
    match err {
        ParseError::TokenizationError { message } => {
            assert!(message.contains("unterminated string"))
        }
        _ => panic!("wrong error type"),
    }
    Ok(())
}

#[test]
fn jack_line_break_in_string() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    let program = "class Main { function void main() { do print(\"a\nb\"); } }";
    let err = Recognizer::new(&compiled).parse(program).unwrap_err();
    match err {
        ParseError::TokenizationError { message } => {
            assert!(message.contains("line break inside string"))
        }
        _ => panic!("wrong error type"),
    }
    Ok(())
}

#[test]
fn jack_eof_in_comment() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    let err = Recognizer::new(&compiled)
        .parse("class Main { } /* trailing")
        .unwrap_err();
    match err {
        ParseError::TokenizationError { message } => {
            assert!(message.contains("unterminated block comment"))
        }
        _ => panic!("wrong error type"),
    }
    Ok(())
}

#[test]
fn jack_empty_and_comment_only_inputs() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    let recognizer = Recognizer::new(&compiled);
    assert!(recognizer.parse("").is_err());
    assert!(recognizer.parse("// nothing here\n/* still nothing */").is_err());
    Ok(())
}

#[test]
fn bnf_pipeline_compiles_and_recognizes() -> Result<(), ParseError> {
    let ebnf = convert_bnf(DECLARATIONS_BNF);
    let compiled = compile(&ebnf)?;
    assert_eq!(compiled.start_rule(), "declaration");
    assert!(compiled.keywords().contains("static"));
    assert!(compiled.symbols().contains("<<"));
    let recognizer = Recognizer::new(&compiled);
    recognizer.parse("static long size = base << shift;")?;
    recognizer.parse("extern int * ptr;")?;
    assert!(recognizer.parse("size = 1;").is_err());
    Ok(())
}

#[test]
fn tables_survive_serialization() -> Result<(), ParseError> {
    let compiled = compile(JACK_GRAMMAR)?;
    let json = serde_json::to_string(&compiled).unwrap();
    let restored: CompiledGrammar = serde_json::from_str(&json).unwrap();
    assert_eq!(compiled, restored);
    Recognizer::new(&restored).parse(JACK_PROGRAM)
}

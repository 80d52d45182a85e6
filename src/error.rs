/// Error wrapping all the possible kind of errors encountered while building
/// and running a parser.
///
/// The possible errors can be:
/// * `IOError` - containing an `std::io::Error`, this kind of error can arise
///   when opening the grammar or the input file on disk fails.
/// * `SyntaxError` - An error containing a `message` String that can arise
///   when the grammar notation itself is malformed.
/// * `InvalidGrammar` - An error arising when a well-formed grammar cannot be
///   compiled, for example because a rule references an undefined nonterminal.
/// * `TokenizationError` - An error arising while splitting the input text
///   into tokens, for example an unterminated string literal.
/// * `RecognitionError` - An error arising when the tokenized input does not
///   belong to the language described by the grammar.
#[derive(Debug)]
pub enum ParseError {
    IOError(std::io::Error),
    SyntaxError { message: String },
    InvalidGrammar { message: String },
    TokenizationError { message: String },
    RecognitionError { message: String },
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::IOError(e)
    }
}

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, buffer: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ParseError::IOError(e) => write!(buffer, "IOError: {}", e),
            ParseError::SyntaxError { message } => write!(buffer, "SyntaxError: {}", message),
            ParseError::InvalidGrammar { message } => {
                write!(buffer, "InvalidGrammar: {}", message)
            }
            ParseError::TokenizationError { message } => {
                write!(buffer, "TokenizationError: {}", message)
            }
            ParseError::RecognitionError { message } => {
                write!(buffer, "RecognitionError: {}", message)
            }
        }
    }
}

/// Builds the body of a syntax or recognition error message.
///
/// The message reports the position, the offending item, the expectation and
/// the source line with a caret pointing at the failing column.
pub(crate) fn caret_message(
    source: &str,
    line: u32,
    column: u32,
    got: &str,
    expected: &str,
) -> String {
    let mut message = format!(
        "at line {}, column {}\nGot: {}\nExpected: {}",
        line, column, got, expected
    );
    if let Some(context) = source.lines().nth(line.saturating_sub(1) as usize) {
        let pointer = " ".repeat(column.saturating_sub(1) as usize) + "^";
        message.push_str(&format!("\nContext:\n{}\n{}", context, pointer));
    }
    message
}

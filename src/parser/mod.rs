use crate::lexer::TokenType;
use serde::{Deserialize, Serialize};

mod conversion;
mod simulator;

pub use self::conversion::CompiledGrammar;
pub use self::simulator::Recognizer;

/// Built-in token classes that a grammar can reference by name.
///
/// A grammar does not have to spell out what an identifier or a number looks
/// like: writing the terminal (or an otherwise undefined nonterminal)
/// `identifier`, `integerConstant` or `stringLiteral` matches the
/// corresponding token class of the lexer instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialToken {
    /// Matches a [`TokenType::Identifier`] token.
    Identifier,
    /// Matches a [`TokenType::Integer`] token.
    IntegerConstant,
    /// Matches a [`TokenType::StringLit`] token.
    StringLiteral,
}

impl SpecialToken {
    /// Maps a grammar name to its built-in token class, if any.
    pub(crate) fn from_name(name: &str) -> Option<SpecialToken> {
        match name {
            "identifier" => Some(SpecialToken::Identifier),
            "integerConstant" => Some(SpecialToken::IntegerConstant),
            "stringLiteral" => Some(SpecialToken::StringLiteral),
            _ => None,
        }
    }

    /// The token class matched by this special terminal.
    pub(crate) fn token_type(self) -> TokenType {
        match self {
            SpecialToken::Identifier => TokenType::Identifier,
            SpecialToken::IntegerConstant => TokenType::Integer,
            SpecialToken::StringLiteral => TokenType::StringLit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SpecialToken;

    #[test]
    fn special_token_names() {
        assert_eq!(
            SpecialToken::from_name("identifier"),
            Some(SpecialToken::Identifier)
        );
        assert_eq!(
            SpecialToken::from_name("integerConstant"),
            Some(SpecialToken::IntegerConstant)
        );
        assert_eq!(
            SpecialToken::from_name("stringLiteral"),
            Some(SpecialToken::StringLiteral)
        );
        assert_eq!(SpecialToken::from_name("number"), None);
    }
}

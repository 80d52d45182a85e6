/// Module containing the errors that may arise during the parser generation.
pub mod error;
/// Module providing the definition of a Grammar, with the parsers for the
/// EBNF and BNF notations.
pub mod grammar;
/// Module responsible of splitting the input text into tokens.
pub mod lexer;
/// Module responsible of compiling a grammar and running the recognizer.
pub mod parser;

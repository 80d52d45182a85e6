use clap::Parser;
use std::io::Read;
use std::process::ExitCode;
use takin::grammar::{convert_bnf, Grammar};
use takin::parser::{CompiledGrammar, Recognizer};

/// Parser generator using the EBNF grammar syntax
///
/// Compiles an EBNF (or BNF, with --bnf) grammar into recognition tables and
/// checks an input program against them. With --emit-tables the JSON-encoded
/// tables are printed instead, for later use with the runtime provided in
/// this same project.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to the input EBNF grammar
    grammar: String,
    /// Path to the program to recognize, stdin when missing
    input: Option<String>,
    /// Treat the grammar as BNF and convert it before compiling
    #[arg(long)]
    bnf: bool,
    /// Print the JSON-encoded recognition tables and exit
    #[arg(long)]
    emit_tables: bool,
    /// Token text to report as an error recovery point, repeatable
    #[arg(long = "sync-point")]
    sync_points: Vec<String>,
}

fn run(args: &Args) -> Result<(), takin::error::ParseError> {
    let grammar = if args.bnf {
        let bnf = std::fs::read_to_string(&args.grammar)?;
        Grammar::parse_ebnf_string(&convert_bnf(&bnf))?
    } else {
        Grammar::parse_ebnf(&args.grammar)?
    };
    let compiled = CompiledGrammar::compile(&grammar)?;
    if args.emit_tables {
        let json = serde_json::to_string(&compiled).expect("Could not serialize the tables");
        println!("{}", json);
        return Ok(());
    }
    let input = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let recognizer =
        Recognizer::new(&compiled).with_sync_points(args.sync_points.iter().cloned());
    recognizer.parse(&input)?;
    println!("Input recognized by rule `{}`", compiled.start_rule());
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

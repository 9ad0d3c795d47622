mod ast;
mod builtins;
mod diagnostics;
mod env;
mod eval;
mod lexer;
mod parser;
mod span;
mod token;
mod value;

use anyhow::Context;
use clap::Parser as ClapParser;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use value::Value;

#[derive(ClapParser, Debug)]
#[command(name = "karst", version, about = "Tree-walking interpreter for the karst language")]
struct Cli {
    /// Path to a script file. Reads stdin when omitted.
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
    /// Print the token stream produced by the lexer.
    #[arg(long)]
    tokens: bool,
    /// Print the parsed program in canonical form instead of running it.
    #[arg(long)]
    ast: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let source = read_source(cli.input.as_deref())?;

    let tokens = lexer::lex(&source);
    if cli.tokens {
        for token in &tokens {
            println!("{:<12} {}", token.kind.name(), token.kind.literal());
        }
        if !cli.ast {
            return Ok(ExitCode::SUCCESS);
        }
    }

    let report = parser::parse_tokens(tokens);
    if !report.errors.is_empty() {
        for error in &report.errors {
            eprintln!("{}", diagnostics::format_parse_error(&source, error));
        }
        return Ok(ExitCode::FAILURE);
    }

    if cli.ast {
        println!("{}", report.program);
        return Ok(ExitCode::SUCCESS);
    }

    let env = env::Environment::new();
    match eval::eval_block(&report.program, &env) {
        Ok(result) => {
            // A top-level return is absorbed here, like any call boundary.
            let result = match result {
                Value::ReturnSignal(inner) => *inner,
                other => other,
            };
            println!("{}", result.inspect());
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            let formatted =
                diagnostics::format_diagnostic(&source, error.span(), &error.to_string());
            eprintln!("{formatted}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn read_source(path: Option<&std::path::Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

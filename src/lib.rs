pub mod ast;
pub mod builtins;
pub mod diagnostics;
pub mod env;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
pub mod value;

pub use diagnostics::{ParseError, RuntimeError, RuntimeResult};
pub use env::Environment;
pub use parser::ParseReport;
pub use value::Value;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod interpreter_tests;

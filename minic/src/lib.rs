pub mod error;
pub mod gen;
pub mod grammer;
pub mod sem;

pub use error::{Diagnostic, Error};
pub use gen::asm::Asm;

use grammer::ast::Program;
use grammer::lexer::Lexer;
use grammer::parsercore::Parser;

/// Tokenize and parse a whole source file.
pub fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
    let tokens = Lexer::new(source).parse();
    Parser::new(tokens.into_iter()).parse()
}

/// Run every pass over `source`. Stops at the first pass that reports errors.
pub fn compile(file: &str, source: &str) -> Result<Asm, Error> {
    log::info!("compiling {file}");
    let (program, errors) = parse(source);
    if !errors.is_empty() {
        return Err(Error::Diagnostics(errors));
    }
    let checked = sem::analyze(&program).map_err(Error::Diagnostics)?;
    gen::codegen::generate(&checked)
}

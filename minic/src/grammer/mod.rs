pub mod ast;
pub mod lexer;
pub mod parser;
pub mod parsercore;
pub mod printer;
pub mod token;

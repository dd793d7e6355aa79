use crate::grammer::ast::{Op, Type};
use crate::grammer::token::{Pos, Token, TokenKind};
use color_print::cprintln;
use std::fmt;
use thiserror::Error;

// Token information kept in diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub kind: TokenKind,
    pub pos: Pos,
    /// Sequence number of the token in the stream
    pub index: usize,
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}", self.kind, self.pos)
    }
}

impl TokenInfo {
    pub fn new(token: &Token, index: usize) -> Self {
        TokenInfo {
            kind: token.kind.clone(),
            pos: token.pos,
            index,
        }
    }
}

// Unified error type for minic
#[derive(Debug, Error)]
pub enum Error {
    // Syntax errors
    #[error("Unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenInfo,
    },

    #[error("Integer literal out of range: {0}")]
    IntegerOverflow(String),

    // Name errors
    #[error("Use of undeclared variable `{0}`")]
    UndeclaredVariable(String),

    #[error("Call to undeclared function `{0}`")]
    UndeclaredFunction(String),

    #[error("`{0}` is a variable, not a function")]
    NotAFunction(String),

    #[error("Duplicate declaration of `{0}`")]
    DuplicateDeclaration(String),

    #[error("Identifier `{0}` is reserved")]
    ReservedIdentifier(String),

    // Type errors
    #[error("Declaration of variable `{0}` of type void")]
    VoidVariable(String),

    #[error("Use of undeclared struct type `struct {0}`")]
    UndeclaredStruct(String),

    #[error("Duplicate declaration of `struct {0}`")]
    DuplicateStruct(String),

    #[error("Duplicate field `{1}` in `struct {0}`")]
    DuplicateField(String, String),

    #[error("`struct {0}` contains itself")]
    RecursiveStruct(String),

    #[error("Bad operand types for `{op}`: {lhs} and {rhs}")]
    InvalidOperands { op: Op, lhs: Type, rhs: Type },

    #[error("Bad argument types for equality comparison: {0} and {1}")]
    InvalidEquality(Type, Type),

    #[error("Indexing a value of type {0}, which is neither an array nor a pointer")]
    NotIndexable(Type),

    #[error("Array index must be int, found {0}")]
    IndexNotInt(Type),

    #[error("Field access on non-struct type {0}")]
    NotAStruct(Type),

    #[error("Accessing field `{field}` on `struct {name}` which doesn't exist")]
    NoSuchField { name: String, field: String },

    #[error("Dereference of non-pointer type {0}")]
    NotAPointer(Type),

    #[error("Invalid type cast from {from} to {to}")]
    InvalidCast { from: Type, to: Type },

    #[error("Assignment of void or array type {0}")]
    InvalidAssignment(Type),

    #[error("Assignment between {0} and {1}")]
    AssignTypeMismatch(Type, Type),

    #[error("Left side of assignment is not assignable")]
    NotAnLvalue,

    #[error("Condition must be int, found {0}")]
    ConditionNotInt(Type),

    #[error("Missing return value in function returning {0}")]
    MissingReturnValue(Type),

    #[error("Returning {found} from function returning {expected}")]
    ReturnTypeMismatch { expected: Type, found: Type },

    #[error("`{name}` takes {expected} argument(s) but {found} were given")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    // Code generation errors
    #[error("No `main` function to start from")]
    MissingMain,

    #[error("Expression needs more than {0} temporary registers")]
    OutOfRegisters(usize),

    #[error("Internal: {0}")]
    Internal(String),

    // Driver errors
    #[error("{} error(s) found", .0.len())]
    Diagnostics(Vec<Diagnostic>),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),
}

/// An error tied to the source position that caused it.
#[derive(Debug)]
pub struct Diagnostic {
    pub pos: Pos,
    pub error: Error,
}

impl Diagnostic {
    pub fn new(pos: Pos, error: Error) -> Self {
        Diagnostic { pos, error }
    }

    /// Print error with file location and line content
    pub fn print_diag(&self, file: &str, source: &str) {
        cprintln!("<red,bold>error</>: {}", self.error);
        cprintln!("     <blue>--></> <underline>{}:{}</>", file, self.pos);
        cprintln!("      <blue>|</>");

        let line = source.lines().nth(self.pos.row.saturating_sub(1)).unwrap_or("");
        cprintln!(" <blue>{:>4} |</> {}", self.pos.row, line);
        let pad = " ".repeat(self.pos.col.saturating_sub(1));
        cprintln!("      <blue>|</> {}<red,bold>^</>", pad);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.error)
    }
}

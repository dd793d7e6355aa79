use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Self {
        Token { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Double character tokens
    EqualEqual,  // '=='
    ExclEqual,   // '!='
    LAngleEqual, // '<='
    RAngleEqual, // '>='
    AmpAmp,      // '&&'
    PipePipe,    // '||'

    // Single character tokens
    Equal,     // '='
    Plus,      // '+'
    Minus,     // '-'
    Star,      // '*'
    Slash,     // '/'
    Percent,   // '%'
    LAngle,    // '<'
    RAngle,    // '>'
    Semicolon, // ';'
    Comma,     // ','
    Period,    // '.'
    LParen,    // '('
    RParen,    // ')'
    LBracket,  // '['
    RBracket,  // ']'
    LCurly,    // '{'
    RCurly,    // '}'

    // Keywords
    KwInt,     // "int"
    KwChar,    // "char"
    KwVoid,    // "void"
    KwStruct,  // "struct"
    KwIf,      // "if"
    KwElse,    // "else"
    KwWhile,   // "while"
    KwReturn,  // "return"
    KwSizeof,  // "sizeof"
    KwInclude, // "#include"

    // Identifier
    Ident(String),

    // Literals
    Number(String, usize),
    Text(String),
    Char(char),

    // Special
    Comment(String),
    Error(String),
    Eof,
}

impl TokenKind {
    /// Tokens that can begin a type.
    pub fn is_type_start(&self) -> bool {
        matches!(
            self,
            TokenKind::KwInt | TokenKind::KwChar | TokenKind::KwVoid | TokenKind::KwStruct
        )
    }
}

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(row: usize, col: usize) -> Self {
        Pos { row, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

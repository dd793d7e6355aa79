use super::token::Pos;
use std::fmt;

/// Identity of an expression node. Later passes key their side tables by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Identity of a variable declaration (global, local, parameter or field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub structs: Vec<StructTypeDecl>,
    pub globals: Vec<VarDecl>,
    pub funs: Vec<FunDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    // "int"
    Int,
    // "char"
    Char,
    // "void"
    Void,
    // type "*"
    Pointer(Box<Type>),
    // type ident "[" number "]"
    Array(Box<Type>, usize),
    // "struct" ident
    Struct(String),
}

impl Type {
    pub fn pointer(to: Type) -> Type {
        Type::Pointer(Box::new(to))
    }

    pub fn array(of: Type, len: usize) -> Type {
        Type::Array(Box::new(of), len)
    }

    /// Values of these types are handled by address.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Type::Array(..) | Type::Struct(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: DeclId,
    pub ty: Type,
    pub name: String,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub ret: Type,
    pub name: String,
    pub params: Vec<VarDecl>,
    pub body: Block,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructTypeDecl {
    pub name: String,
    pub fields: Vec<VarDecl>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub vars: Vec<VarDecl>,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    // "{" { vardecl } { stmt } "}"
    Block(Block),
    // "while" "(" expr ")" stmt
    While(Expr, Box<Stmt>),
    // "if" "(" expr ")" stmt [ "else" stmt ]
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    // "return" [ expr ] ";"
    Return(Option<Expr>, Pos),
    // expr "=" expr ";"
    Assign(Expr, Expr),
    // expr ";"
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // number
    IntLiteral(i32),
    // 'c'
    ChrLiteral(char),
    // "text"
    StrLiteral(String),
    // ident
    Var(String),
    // ident "(" [ expr { "," expr } ] ")"
    FunCall(String, Vec<Expr>),
    // expr op expr
    BinOp(Op, Box<Expr>, Box<Expr>),
    // "*" expr
    ValueAt(Box<Expr>),
    // expr "." ident
    FieldAccess(Box<Expr>, String),
    // expr "[" expr "]"
    ArrayAccess(Box<Expr>, Box<Expr>),
    // "sizeof" "(" type ")"
    SizeOf(Type),
    // "(" type ")" expr
    TypeCast(Type, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
    Eq,
    Or,
    And,
}

impl Op {
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Mod => "%",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Ge => ">=",
            Op::Le => "<=",
            Op::Ne => "!=",
            Op::Eq => "==",
            Op::Or => "||",
            Op::And => "&&",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Char => write!(f, "char"),
            Type::Void => write!(f, "void"),
            Type::Pointer(to) => write!(f, "{to}*"),
            Type::Array(of, len) => write!(f, "{of}[{len}]"),
            Type::Struct(name) => write!(f, "struct {name}"),
        }
    }
}

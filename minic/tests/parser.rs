use minic::error::Error;
use minic::grammer::ast::{
    Block, DeclId, Expr, ExprKind, FunDecl, NodeId, Op, Program, Stmt, StructTypeDecl, Type, VarDecl,
};
use minic::grammer::token::Pos;
use minic::grammer::printer::print_program;
use minic::parse;

fn assert(code: &str, expect: &str) {
    let (program, errors) = parse(code);
    for err in &errors {
        println!("{err}");
    }
    assert!(errors.is_empty());

    let printed = print_program(&program);
    println!("{printed}");
    assert_eq!(printed, expect);

    // Printing is a fixed point
    let (reparsed, errors) = parse(&printed);
    assert!(errors.is_empty());
    assert_eq!(print_program(&reparsed), printed);
    assert_eq!(normalize(reparsed), normalize(program));
}

/// Drop ids and positions so trees parsed from different text compare by shape.
fn normalize(program: Program) -> Program {
    Program {
        structs: program
            .structs
            .into_iter()
            .map(|decl| StructTypeDecl {
                name: decl.name,
                fields: decl.fields.into_iter().map(var).collect(),
                pos: Pos::default(),
            })
            .collect(),
        globals: program.globals.into_iter().map(var).collect(),
        funs: program
            .funs
            .into_iter()
            .map(|fun| FunDecl {
                ret: fun.ret,
                name: fun.name,
                params: fun.params.into_iter().map(var).collect(),
                body: block(fun.body),
                pos: Pos::default(),
            })
            .collect(),
    }
}

fn var(decl: VarDecl) -> VarDecl {
    VarDecl {
        id: DeclId(0),
        pos: Pos::default(),
        ..decl
    }
}

fn block(block: Block) -> Block {
    Block {
        vars: block.vars.into_iter().map(var).collect(),
        stmts: block.stmts.into_iter().map(stmt).collect(),
    }
}

fn stmt(stmt: Stmt) -> Stmt {
    match stmt {
        Stmt::Block(inner) => Stmt::Block(block(inner)),
        Stmt::While(cond, body) => Stmt::While(expr(cond), Box::new(self::stmt(*body))),
        Stmt::If(cond, then, other) => Stmt::If(
            expr(cond),
            Box::new(self::stmt(*then)),
            other.map(|other| Box::new(self::stmt(*other))),
        ),
        Stmt::Return(value, _) => Stmt::Return(value.map(expr), Pos::default()),
        Stmt::Assign(lhs, rhs) => Stmt::Assign(expr(lhs), expr(rhs)),
        Stmt::Expr(value) => Stmt::Expr(expr(value)),
    }
}

fn expr(expr: Expr) -> Expr {
    let boxed = |inner: Box<Expr>| Box::new(self::expr(*inner));
    let kind = match expr.kind {
        ExprKind::FunCall(name, args) => {
            ExprKind::FunCall(name, args.into_iter().map(self::expr).collect())
        }
        ExprKind::BinOp(op, lhs, rhs) => ExprKind::BinOp(op, boxed(lhs), boxed(rhs)),
        ExprKind::ValueAt(inner) => ExprKind::ValueAt(boxed(inner)),
        ExprKind::FieldAccess(base, field) => ExprKind::FieldAccess(boxed(base), field),
        ExprKind::ArrayAccess(base, index) => ExprKind::ArrayAccess(boxed(base), boxed(index)),
        ExprKind::TypeCast(ty, inner) => ExprKind::TypeCast(ty, boxed(inner)),
        kind => kind,
    };
    Expr {
        id: NodeId(0),
        kind,
        pos: Pos::default(),
    }
}

macro_rules! case {
    ($name:ident, $code:expr, $expect:expr) => {
        #[test]
        fn $name() {
            assert($code, $expect);
        }
    };
}

case!(
    test_precedence,
    "int main() { return 1 + 2 * 3 - 4 / 2; }",
    "int main() {\n    return ((1 + (2 * 3)) - (4 / 2));\n}\n"
);

case!(
    test_logical,
    "void f() { if (a < b && c == d || e) x = 1; else { x = 2; } }",
    "void f() {\n    if ((((a < b) && (c == d)) || e))\n        x = 1;\n    else {\n        x = 2;\n    }\n}\n"
);

case!(
    test_unary,
    "int f(int* p) { return -*p + sizeof(struct s) + (char) p[1]; }",
    "int f(int* p) {\n    return (((0 - (*p)) + (sizeof(struct s))) + ((char) p[1]));\n}\n"
);

case!(
    test_declarations,
    "#include \"minic-stdlib.h\"\nstruct pt { int x; char tag[3]; };\nstruct pt g;\nint m[2][3];\nvoid main() { struct pt* q; while (1) { } }",
    "struct pt {\n    int x;\n    char tag[3];\n};\nstruct pt g;\nint m[2][3];\nvoid main() {\n    struct pt* q;\n    while (1) {\n    }\n}\n"
);

case!(
    test_postfix,
    "void main() { a.b[2].c = f(\"hi\\n\", 'x', g()); }",
    "void main() {\n    a.b[2].c = f(\"hi\\n\", 'x', g());\n}\n"
);

#[test]
fn test_array_dims() {
    let (program, errors) = parse("int m[2][3];");
    assert!(errors.is_empty());
    assert_eq!(
        program.globals[0].ty,
        Type::array(Type::array(Type::Int, 3), 2)
    );
}

#[test]
fn test_struct_variable_vs_decl() {
    // `struct s x;` is a variable, `struct s { ... };` a type declaration
    let (program, errors) = parse("struct s { int a; };\nstruct s x;\nstruct s* f() { return 0; }");
    assert!(errors.is_empty());
    assert_eq!(program.structs.len(), 1);
    assert_eq!(program.globals.len(), 1);
    assert_eq!(program.globals[0].ty, Type::Struct("s".to_string()));
    assert_eq!(program.funs[0].ret, Type::pointer(Type::Struct("s".to_string())));
}

#[test]
fn test_left_associative() {
    let (program, errors) = parse("int f() { return 8 - 4 - 2; }");
    assert!(errors.is_empty());
    let Stmt::Return(Some(expr), _) = &program.funs[0].body.stmts[0] else {
        panic!("expected return");
    };
    let ExprKind::BinOp(Op::Sub, lhs, _) = &expr.kind else {
        panic!("expected subtraction");
    };
    assert!(matches!(lhs.kind, ExprKind::BinOp(Op::Sub, ..)));
}

#[test]
fn test_error_recovery() {
    // Each broken statement is reported and parsing carries on
    let (program, errors) = parse("void f() { x = ; y = 1; z = ) ; }\nvoid g() { }");
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|d| matches!(d.error, Error::UnexpectedToken { .. })));
    assert_eq!(program.funs.len(), 2);
    assert_eq!(program.funs[0].body.stmts.len(), 1);
}

#[test]
fn test_error_position() {
    let (_, errors) = parse("int main() {\n  return 1\n}");
    assert_eq!(errors.len(), 1);
    assert_eq!((errors[0].pos.row, errors[0].pos.col), (3, 1));
}

#[test]
fn test_integer_overflow() {
    let (_, errors) = parse("int main() { return 2147483648; }");
    assert!(matches!(errors[0].error, Error::IntegerOverflow(_)));
}

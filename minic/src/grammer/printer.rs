use super::ast::{Block, Expr, ExprKind, Program, Stmt, Type, VarDecl};
use itertools::Itertools;

/// Render a program in canonical source form. Every binary operation, dereference,
/// cast and `sizeof` is parenthesized, so the output parses back to the same tree.
pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::default();
    for decl in &program.structs {
        printer.line(0, format!("struct {} {{", decl.name));
        for field in &decl.fields {
            printer.line(1, format!("{};", declarator(field)));
        }
        printer.line(0, "};");
    }
    for global in &program.globals {
        printer.line(0, format!("{};", declarator(global)));
    }
    for fun in &program.funs {
        let params = fun.params.iter().map(declarator).join(", ");
        printer.line(0, format!("{} {}({}) {{", fun.ret, fun.name, params));
        printer.block_body(&fun.body, 1);
        printer.line(0, "}");
    }
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
}

impl Printer {
    fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        self.out.push_str(&"    ".repeat(indent));
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn block_body(&mut self, block: &Block, indent: usize) {
        for var in &block.vars {
            self.line(indent, format!("{};", declarator(var)));
        }
        for stmt in &block.stmts {
            self.stmt(stmt, indent);
        }
    }

    fn stmt(&mut self, stmt: &Stmt, indent: usize) {
        match stmt {
            Stmt::Block(block) => {
                self.line(indent, "{");
                self.block_body(block, indent + 1);
                self.line(indent, "}");
            }
            Stmt::While(cond, body) => {
                self.nested(format!("while ({})", print_expr(cond)), body, indent);
            }
            Stmt::If(cond, then, els) => {
                self.nested(format!("if ({})", print_expr(cond)), then, indent);
                if let Some(els) = els {
                    self.nested("else".to_string(), els, indent);
                }
            }
            Stmt::Return(Some(expr), _) => self.line(indent, format!("return {};", print_expr(expr))),
            Stmt::Return(None, _) => self.line(indent, "return;"),
            Stmt::Assign(lhs, rhs) => {
                self.line(indent, format!("{} = {};", print_expr(lhs), print_expr(rhs)))
            }
            Stmt::Expr(expr) => self.line(indent, format!("{};", print_expr(expr))),
        }
    }

    fn nested(&mut self, head: String, body: &Stmt, indent: usize) {
        match body {
            Stmt::Block(block) => {
                self.line(indent, format!("{head} {{"));
                self.block_body(block, indent + 1);
                self.line(indent, "}");
            }
            _ => {
                self.line(indent, head);
                self.stmt(body, indent + 1);
            }
        }
    }
}

/// `int a[2][3]`, `struct S* p`
fn declarator(decl: &VarDecl) -> String {
    let mut dims = String::new();
    let mut ty = &decl.ty;
    while let Type::Array(of, len) = ty {
        dims.push_str(&format!("[{len}]"));
        ty = of;
    }
    format!("{} {}{}", ty, decl.name, dims)
}

pub fn print_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::IntLiteral(value) => value.to_string(),
        ExprKind::ChrLiteral(ch) => format!("'{}'", escape(*ch, '\'')),
        ExprKind::StrLiteral(text) => {
            format!("\"{}\"", text.chars().map(|ch| escape(ch, '"')).join(""))
        }
        ExprKind::Var(name) => name.clone(),
        ExprKind::FunCall(name, args) => {
            format!("{}({})", name, args.iter().map(print_expr).join(", "))
        }
        ExprKind::BinOp(op, lhs, rhs) => {
            format!("({} {} {})", print_expr(lhs), op, print_expr(rhs))
        }
        ExprKind::ValueAt(inner) => format!("(*{})", print_expr(inner)),
        ExprKind::FieldAccess(base, field) => format!("{}.{}", print_expr(base), field),
        ExprKind::ArrayAccess(base, index) => {
            format!("{}[{}]", print_expr(base), print_expr(index))
        }
        ExprKind::SizeOf(ty) => format!("(sizeof({ty}))"),
        ExprKind::TypeCast(ty, inner) => format!("(({ty}) {})", print_expr(inner)),
    }
}

fn escape(ch: char, quote: char) -> String {
    match ch {
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        '\0' => "\\0".to_string(),
        '\\' => "\\\\".to_string(),
        ch if ch == quote => format!("\\{ch}"),
        ch => ch.to_string(),
    }
}

use super::asm::{Asm, Directive, Line, Section};
use super::func::{str_label, FuncGen};
use super::layout::StructLayouts;
use crate::error::Error;
use crate::grammer::ast::{Block, Expr, ExprKind, NodeId, Program, Stmt};
use crate::sem::Checked;
use arch::inst::Inst;
use arch::reg::Reg;
use arch::syscall::Syscall;
use indexmap::IndexMap;

pub const EXIT: &str = "__exit";

/// Lower a checked program to assembly.
pub fn generate(checked: &Checked) -> Result<Asm, Error> {
    let program = checked.program();
    if !program.funs.iter().any(|fun| fun.name == "main") {
        return Err(Error::MissingMain);
    }

    // Pass 0: layouts, global storage, string literals
    let layouts = StructLayouts::compute(&program.structs)?;
    let mut lines = vec![Line::Section(Section::Data)];
    for global in &program.globals {
        lines.extend([
            Line::Directive(Directive::Align(2)),
            Line::Label(global.name.clone()),
            Line::Directive(Directive::Space(layouts.size_of(&global.ty)?)),
        ]);
    }
    let strings = collect_strings(program);
    for (id, text) in strings.values().enumerate() {
        lines.extend([
            Line::Label(str_label(id)),
            Line::Directive(Directive::Asciiz(text.clone())),
        ]);
    }
    log::debug!(
        "codegen pass 0: {} struct(s), {} global(s), {} string(s)",
        program.structs.len(),
        program.globals.len(),
        strings.len()
    );

    // Pass 1: text
    lines.extend([
        Line::Section(Section::Text),
        Line::Inst(Inst::Jal("main".to_string())),
        Line::Inst(Inst::J(EXIT.to_string())),
    ]);
    let mut labels = 0;
    for fun in &program.funs {
        let gen = FuncGen::new(checked, &layouts, &strings, &mut labels, &fun.name);
        lines.extend(gen.generate(fun)?);
    }
    lines.extend([
        Line::Label(EXIT.to_string()),
        Line::Inst(Inst::Li(Reg::V0, Syscall::Exit.code())),
        Line::Inst(Inst::Syscall),
    ]);
    log::debug!("codegen pass 1: {} line(s)", lines.len());
    Ok(Asm(lines))
}

/// String literals in source order.
pub fn collect_strings(program: &Program) -> IndexMap<NodeId, String> {
    let mut strings = IndexMap::new();
    for fun in &program.funs {
        strings_block(&fun.body, &mut strings);
    }
    strings
}

fn strings_block(block: &Block, strings: &mut IndexMap<NodeId, String>) {
    for stmt in &block.stmts {
        strings_stmt(stmt, strings);
    }
}

fn strings_stmt(stmt: &Stmt, strings: &mut IndexMap<NodeId, String>) {
    match stmt {
        Stmt::Block(block) => strings_block(block, strings),
        Stmt::While(cond, body) => {
            strings_expr(cond, strings);
            strings_stmt(body, strings);
        }
        Stmt::If(cond, then, els) => {
            strings_expr(cond, strings);
            strings_stmt(then, strings);
            if let Some(els) = els {
                strings_stmt(els, strings);
            }
        }
        Stmt::Return(expr, _) => {
            if let Some(expr) = expr {
                strings_expr(expr, strings);
            }
        }
        Stmt::Assign(lhs, rhs) => {
            strings_expr(lhs, strings);
            strings_expr(rhs, strings);
        }
        Stmt::Expr(expr) => strings_expr(expr, strings),
    }
}

fn strings_expr(expr: &Expr, strings: &mut IndexMap<NodeId, String>) {
    match &expr.kind {
        ExprKind::StrLiteral(text) => {
            strings.insert(expr.id, text.clone());
        }
        ExprKind::IntLiteral(_)
        | ExprKind::ChrLiteral(_)
        | ExprKind::Var(_)
        | ExprKind::SizeOf(_) => {}
        ExprKind::FunCall(_, args) => {
            for arg in args {
                strings_expr(arg, strings);
            }
        }
        ExprKind::BinOp(_, lhs, rhs) | ExprKind::ArrayAccess(lhs, rhs) => {
            strings_expr(lhs, strings);
            strings_expr(rhs, strings);
        }
        ExprKind::ValueAt(inner)
        | ExprKind::FieldAccess(inner, _)
        | ExprKind::TypeCast(_, inner) => strings_expr(inner, strings),
    }
}

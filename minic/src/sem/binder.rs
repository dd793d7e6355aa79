use super::intrinsic::Intrinsic;
use crate::error::{Diagnostic, Error};
use crate::grammer::ast::{Block, DeclId, Expr, ExprKind, NodeId, Program, Stmt, Type, VarDecl};
use crate::grammer::token::Pos;
use indexmap::IndexMap;
use std::collections::HashMap;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarInfo {
    pub name: String,
    pub ty: Type,
    pub scope: Scope,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunSig {
    pub ret: Type,
    pub params: Vec<Type>,
    pub intrinsic: Option<Intrinsic>,
}

/// Name resolution results, keyed by node identity.
#[derive(Debug, Default)]
pub struct Bindings {
    vars: HashMap<NodeId, DeclId>,
    calls: HashMap<NodeId, String>,
    decls: HashMap<DeclId, VarInfo>,
    funs: IndexMap<String, FunSig>,
}

impl Bindings {
    /// Declaration a variable reference resolves to
    pub fn decl_of(&self, var: NodeId) -> Option<DeclId> {
        self.vars.get(&var).copied()
    }

    pub fn decl(&self, id: DeclId) -> Option<&VarInfo> {
        self.decls.get(&id)
    }

    pub fn var(&self, var: NodeId) -> Option<&VarInfo> {
        self.decl_of(var).and_then(|id| self.decl(id))
    }

    pub fn fun(&self, name: &str) -> Option<&FunSig> {
        self.funs.get(name)
    }

    /// Signature a call expression resolves to
    pub fn call(&self, call: NodeId) -> Option<&FunSig> {
        self.calls.get(&call).and_then(|name| self.fun(name))
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.len()
    }
}

pub struct Binder<'a> {
    scopes: Vec<IndexMap<&'a str, DeclId>>,
    bindings: Bindings,
    errors: Vec<Diagnostic>,
}

impl<'a> Default for Binder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Binder<'a> {
    pub fn new() -> Self {
        let mut bindings = Bindings::default();
        for intrinsic in Intrinsic::iter() {
            let (ret, params) = intrinsic.signature();
            bindings.funs.insert(
                intrinsic.as_ref().to_string(),
                FunSig {
                    ret,
                    params,
                    intrinsic: Some(intrinsic),
                },
            );
        }
        Binder {
            scopes: vec![IndexMap::new()],
            bindings,
            errors: Vec::new(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn finish(self) -> (Bindings, Vec<Diagnostic>) {
        (self.bindings, self.errors)
    }

    fn error(&mut self, pos: Pos, err: Error) {
        self.errors.push(Diagnostic::new(pos, err));
    }

    fn reserved(&mut self, name: &str, pos: Pos) {
        if name.starts_with("__") {
            self.error(pos, Error::ReservedIdentifier(name.to_string()));
        }
    }

    fn lookup(&self, name: &str) -> Option<DeclId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn declare(&mut self, var: &'a VarDecl, scope: Scope) {
        self.reserved(&var.name, var.pos);
        let clash = match self.scopes.last() {
            Some(top) => top.contains_key(var.name.as_str()),
            None => false,
        } || (scope == Scope::Global && self.bindings.funs.contains_key(&var.name));
        if clash {
            self.error(var.pos, Error::DuplicateDeclaration(var.name.clone()));
            return;
        }
        if let Some(top) = self.scopes.last_mut() {
            top.insert(var.name.as_str(), var.id);
        }
        self.bindings.decls.insert(
            var.id,
            VarInfo {
                name: var.name.clone(),
                ty: var.ty.clone(),
                scope,
            },
        );
    }
}

impl<'a> Binder<'a> {
    pub fn bind_program(&mut self, program: &'a Program) {
        // Every function is visible from every body, so recursion needs no prototype
        for fun in &program.funs {
            self.reserved(&fun.name, fun.pos);
            if self.bindings.funs.contains_key(&fun.name) {
                self.error(fun.pos, Error::DuplicateDeclaration(fun.name.clone()));
                continue;
            }
            self.bindings.funs.insert(
                fun.name.clone(),
                FunSig {
                    ret: fun.ret.clone(),
                    params: fun.params.iter().map(|p| p.ty.clone()).collect(),
                    intrinsic: None,
                },
            );
        }

        for global in &program.globals {
            self.declare(global, Scope::Global);
        }

        for fun in &program.funs {
            self.scopes.push(IndexMap::new());
            for param in &fun.params {
                self.declare(param, Scope::Local);
            }
            // The body shares the parameter scope
            self.bind_block(&fun.body, false);
            self.scopes.pop();
        }

        log::debug!(
            "binder: {} variable references, {} calls, {} error(s)",
            self.bindings.var_count(),
            self.bindings.call_count(),
            self.errors.len()
        );
    }

    fn bind_block(&mut self, block: &'a Block, new_scope: bool) {
        if new_scope {
            self.scopes.push(IndexMap::new());
        }
        for var in &block.vars {
            self.declare(var, Scope::Local);
        }
        for stmt in &block.stmts {
            self.bind_stmt(stmt);
        }
        if new_scope {
            self.scopes.pop();
        }
    }

    fn bind_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(block) => self.bind_block(block, true),
            Stmt::While(cond, body) => {
                self.bind_expr(cond);
                self.bind_stmt(body);
            }
            Stmt::If(cond, then, els) => {
                self.bind_expr(cond);
                self.bind_stmt(then);
                if let Some(els) = els {
                    self.bind_stmt(els);
                }
            }
            Stmt::Return(expr, _) => {
                if let Some(expr) = expr {
                    self.bind_expr(expr);
                }
            }
            Stmt::Assign(lhs, rhs) => {
                self.bind_expr(lhs);
                self.bind_expr(rhs);
            }
            Stmt::Expr(expr) => self.bind_expr(expr),
        }
    }

    fn bind_expr(&mut self, expr: &'a Expr) {
        match &expr.kind {
            ExprKind::IntLiteral(_)
            | ExprKind::ChrLiteral(_)
            | ExprKind::StrLiteral(_)
            | ExprKind::SizeOf(_) => {}
            ExprKind::Var(name) => match self.lookup(name) {
                Some(decl) => {
                    self.bindings.vars.insert(expr.id, decl);
                }
                None => self.error(expr.pos, Error::UndeclaredVariable(name.clone())),
            },
            ExprKind::FunCall(name, args) => {
                if self.bindings.funs.contains_key(name) {
                    self.bindings.calls.insert(expr.id, name.clone());
                } else if self.lookup(name).is_some() {
                    self.error(expr.pos, Error::NotAFunction(name.clone()));
                } else {
                    self.error(expr.pos, Error::UndeclaredFunction(name.clone()));
                }
                for arg in args {
                    self.bind_expr(arg);
                }
            }
            ExprKind::BinOp(_, lhs, rhs) | ExprKind::ArrayAccess(lhs, rhs) => {
                self.bind_expr(lhs);
                self.bind_expr(rhs);
            }
            ExprKind::ValueAt(inner)
            | ExprKind::FieldAccess(inner, _)
            | ExprKind::TypeCast(_, inner) => self.bind_expr(inner),
        }
    }
}

/// Resolve every name in `program`.
pub fn bind(program: &Program) -> (Bindings, Vec<Diagnostic>) {
    let mut binder = Binder::new();
    binder.bind_program(program);
    binder.finish()
}

use super::binder::Bindings;
use crate::error::{Diagnostic, Error};
use crate::grammer::ast::{
    Block, Expr, ExprKind, FunDecl, NodeId, Op, Program, Stmt, StructTypeDecl, Type, VarDecl,
};
use crate::grammer::token::Pos;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Type of every well-typed expression, keyed by node.
#[derive(Debug, Default)]
pub struct TypeTable(HashMap<NodeId, Type>);

impl TypeTable {
    pub fn get(&self, id: NodeId) -> Option<&Type> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct TypeChecker<'a> {
    bindings: &'a Bindings,
    structs: IndexMap<&'a str, IndexMap<&'a str, Type>>,
    types: TypeTable,
    errors: Vec<Diagnostic>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(bindings: &'a Bindings) -> Self {
        TypeChecker {
            bindings,
            structs: IndexMap::new(),
            types: TypeTable::default(),
            errors: Vec::new(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn finish(self) -> (TypeTable, Vec<Diagnostic>) {
        (self.types, self.errors)
    }

    fn error(&mut self, pos: Pos, err: Error) {
        self.errors.push(Diagnostic::new(pos, err));
    }

    /// Every struct named inside `ty` must already be declared.
    fn check_type(&mut self, ty: &Type, pos: Pos) -> bool {
        match ty {
            Type::Int | Type::Char | Type::Void => true,
            Type::Pointer(inner) | Type::Array(inner, _) => self.check_type(inner, pos),
            Type::Struct(name) => {
                let known = self.structs.contains_key(name.as_str());
                if !known {
                    self.error(pos, Error::UndeclaredStruct(name.clone()));
                }
                known
            }
        }
    }

    fn check_var(&mut self, var: &VarDecl) {
        let mut base = &var.ty;
        while let Type::Array(of, _) = base {
            base = of;
        }
        if *base == Type::Void {
            self.error(var.pos, Error::VoidVariable(var.name.clone()));
            return;
        }
        self.check_type(&var.ty, var.pos);
    }
}

impl<'a> TypeChecker<'a> {
    pub fn check_program(&mut self, program: &'a Program) {
        for decl in &program.structs {
            self.check_struct(decl);
        }
        for global in &program.globals {
            self.check_var(global);
        }
        for fun in &program.funs {
            self.check_fun(fun);
        }
        log::debug!(
            "typecheck: {} typed expressions, {} error(s)",
            self.types.len(),
            self.errors.len()
        );
    }

    fn check_struct(&mut self, decl: &'a StructTypeDecl) {
        if self.structs.contains_key(decl.name.as_str()) {
            self.error(decl.pos, Error::DuplicateStruct(decl.name.clone()));
            return;
        }
        // Registered first so the fields may point back at it
        self.structs.insert(decl.name.as_str(), IndexMap::new());

        let mut fields = IndexMap::new();
        for field in &decl.fields {
            if contains_by_value(&field.ty, &decl.name) {
                self.error(field.pos, Error::RecursiveStruct(decl.name.clone()));
                continue;
            }
            self.check_var(field);
            if fields.contains_key(field.name.as_str()) {
                self.error(
                    field.pos,
                    Error::DuplicateField(decl.name.clone(), field.name.clone()),
                );
                continue;
            }
            fields.insert(field.name.as_str(), field.ty.clone());
        }
        self.structs.insert(decl.name.as_str(), fields);
    }

    fn check_fun(&mut self, fun: &FunDecl) {
        if fun.ret != Type::Void {
            self.check_type(&fun.ret, fun.pos);
        }
        for param in &fun.params {
            self.check_var(param);
        }
        self.check_block(&fun.body, &fun.ret);
    }

    fn check_block(&mut self, block: &Block, ret: &Type) {
        for var in &block.vars {
            self.check_var(var);
        }
        for stmt in &block.stmts {
            self.check_stmt(stmt, ret);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt, ret: &Type) {
        match stmt {
            Stmt::Block(block) => self.check_block(block, ret),
            Stmt::While(cond, body) => {
                self.check_cond(cond);
                self.check_stmt(body, ret);
            }
            Stmt::If(cond, then, els) => {
                self.check_cond(cond);
                self.check_stmt(then, ret);
                if let Some(els) = els {
                    self.check_stmt(els, ret);
                }
            }
            Stmt::Return(None, pos) => {
                if *ret != Type::Void {
                    self.error(*pos, Error::MissingReturnValue(ret.clone()));
                }
            }
            Stmt::Return(Some(expr), _) => {
                if let Some(found) = self.check_expr(expr) {
                    if found != *ret {
                        self.error(
                            expr.pos,
                            Error::ReturnTypeMismatch {
                                expected: ret.clone(),
                                found,
                            },
                        );
                    }
                }
            }
            Stmt::Assign(lhs, rhs) => self.check_assign(lhs, rhs),
            Stmt::Expr(expr) => {
                self.check_expr(expr);
            }
        }
    }

    fn check_cond(&mut self, cond: &Expr) {
        match self.check_expr(cond) {
            Some(Type::Int) | None => {}
            Some(ty) => self.error(cond.pos, Error::ConditionNotInt(ty)),
        }
    }

    fn check_assign(&mut self, lhs: &Expr, rhs: &Expr) {
        let lty = self.check_expr(lhs);
        let rty = self.check_expr(rhs);
        if !matches!(
            lhs.kind,
            ExprKind::Var(_)
                | ExprKind::FieldAccess(..)
                | ExprKind::ArrayAccess(..)
                | ExprKind::ValueAt(_)
        ) {
            self.error(lhs.pos, Error::NotAnLvalue);
            return;
        }
        let (Some(lty), Some(rty)) = (lty, rty) else {
            return;
        };
        for (ty, pos) in [(&lty, lhs.pos), (&rty, rhs.pos)] {
            if matches!(ty, Type::Void | Type::Array(..)) {
                self.error(pos, Error::InvalidAssignment(ty.clone()));
                return;
            }
        }
        // Structs are copied whole, so both sides must have the same layout
        if (matches!(lty, Type::Struct(_)) || matches!(rty, Type::Struct(_))) && lty != rty {
            self.error(lhs.pos, Error::AssignTypeMismatch(lty, rty));
        }
    }

    /// `None` when the expression (or a part of it) was already reported.
    fn check_expr(&mut self, expr: &Expr) -> Option<Type> {
        let ty = self.infer(expr)?;
        self.types.0.insert(expr.id, ty.clone());
        Some(ty)
    }

    fn infer(&mut self, expr: &Expr) -> Option<Type> {
        match &expr.kind {
            ExprKind::IntLiteral(_) => Some(Type::Int),
            ExprKind::ChrLiteral(_) => Some(Type::Char),
            ExprKind::StrLiteral(text) => Some(Type::array(Type::Char, text.chars().count() + 1)),
            ExprKind::Var(_) => self.bindings.var(expr.id).map(|info| info.ty.clone()),
            ExprKind::FunCall(name, args) => {
                for arg in args {
                    self.check_expr(arg);
                }
                let sig = self.bindings.call(expr.id)?;
                if sig.params.len() != args.len() {
                    self.error(
                        expr.pos,
                        Error::ArgumentCount {
                            name: name.clone(),
                            expected: sig.params.len(),
                            found: args.len(),
                        },
                    );
                    return None;
                }
                Some(sig.ret.clone())
            }
            ExprKind::BinOp(op, lhs, rhs) => {
                let lty = self.check_expr(lhs);
                let rty = self.check_expr(rhs);
                self.binop(*op, lty?, rty?, expr.pos)
            }
            ExprKind::ValueAt(inner) => match self.check_expr(inner)? {
                Type::Pointer(to) => Some(*to),
                ty => {
                    self.error(expr.pos, Error::NotAPointer(ty));
                    None
                }
            },
            ExprKind::FieldAccess(base, field) => match self.check_expr(base)? {
                Type::Struct(name) => {
                    let found = self
                        .structs
                        .get(name.as_str())
                        .and_then(|fields| fields.get(field.as_str()))
                        .cloned();
                    if found.is_none() {
                        self.error(
                            expr.pos,
                            Error::NoSuchField {
                                name,
                                field: field.clone(),
                            },
                        );
                    }
                    found
                }
                ty => {
                    self.error(expr.pos, Error::NotAStruct(ty));
                    None
                }
            },
            ExprKind::ArrayAccess(base, index) => {
                let bty = self.check_expr(base);
                let ity = self.check_expr(index);
                let elem = match bty? {
                    Type::Array(of, _) | Type::Pointer(of) => *of,
                    ty => {
                        self.error(base.pos, Error::NotIndexable(ty));
                        return None;
                    }
                };
                match ity? {
                    Type::Int => Some(elem),
                    ty => {
                        self.error(index.pos, Error::IndexNotInt(ty));
                        None
                    }
                }
            }
            ExprKind::SizeOf(ty) => {
                self.check_type(ty, expr.pos);
                Some(Type::Int)
            }
            ExprKind::TypeCast(to, inner) => {
                let from = self.check_expr(inner)?;
                if !self.check_type(to, expr.pos) {
                    return None;
                }
                let cast = cast(&from, to);
                if cast.is_none() {
                    self.error(
                        expr.pos,
                        Error::InvalidCast {
                            from,
                            to: to.clone(),
                        },
                    );
                }
                cast
            }
        }
    }

    fn binop(&mut self, op: Op, lhs: Type, rhs: Type, pos: Pos) -> Option<Type> {
        match op {
            Op::Eq | Op::Ne => {
                if lhs == rhs {
                    Some(lhs)
                } else if lhs.is_aggregate()
                    || rhs.is_aggregate()
                    || lhs == Type::Void
                    || rhs == Type::Void
                {
                    self.error(pos, Error::InvalidEquality(lhs, rhs));
                    None
                } else {
                    // Mixed scalars compare as words
                    Some(lhs)
                }
            }
            _ => {
                if lhs == Type::Int && rhs == Type::Int {
                    Some(Type::Int)
                } else {
                    self.error(pos, Error::InvalidOperands { op, lhs, rhs });
                    None
                }
            }
        }
    }
}

/// Result type of `(to) e` where `e: from`.
fn cast(from: &Type, to: &Type) -> Option<Type> {
    match (from, to) {
        (Type::Char, Type::Int) => Some(Type::Int),
        (Type::Array(of, _), Type::Pointer(to)) if **of == **to => Some(Type::pointer(*of.clone())),
        (Type::Array(of, _), to) if **of == *to => Some(Type::pointer(to.clone())),
        (Type::Pointer(_), Type::Pointer(_)) => Some(to.clone()),
        (Type::Pointer(_), to) => Some(Type::pointer(to.clone())),
        _ => None,
    }
}

fn contains_by_value(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Struct(other) => other == name,
        Type::Array(of, _) => contains_by_value(of, name),
        _ => false,
    }
}

/// Type-check a bound program.
pub fn check(program: &Program, bindings: &Bindings) -> (TypeTable, Vec<Diagnostic>) {
    let mut checker = TypeChecker::new(bindings);
    checker.check_program(program);
    checker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_rules() {
        let ptr_char = Type::pointer(Type::Char);
        let ptr_int = Type::pointer(Type::Int);
        assert_eq!(cast(&Type::Char, &Type::Int), Some(Type::Int));
        assert_eq!(cast(&Type::Int, &Type::Char), None);
        assert_eq!(cast(&ptr_char, &ptr_int), Some(ptr_int.clone()));
        assert_eq!(cast(&Type::array(Type::Int, 3), &Type::Int), Some(ptr_int.clone()));
        assert_eq!(cast(&Type::array(Type::Int, 3), &ptr_int), Some(ptr_int));
        assert_eq!(
            cast(&Type::array(Type::Struct("S".into()), 3), &Type::Int),
            None
        );
    }

    #[test]
    fn test_recursive_struct() {
        let s = Type::Struct("N".into());
        assert!(contains_by_value(&s, "N"));
        assert!(contains_by_value(&Type::array(s.clone(), 2), "N"));
        assert!(!contains_by_value(&Type::pointer(s), "N"));
    }
}

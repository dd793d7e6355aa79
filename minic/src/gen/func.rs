use super::asm::Line;
use super::frame::Frame;
use super::layout::{is_word, word_align, StructLayouts};
use super::regpool::RegPool;
use crate::error::Error;
use crate::grammer::ast::{Block, DeclId, Expr, ExprKind, FunDecl, NodeId, Op, Stmt, Type};
use crate::sem::binder::Scope;
use crate::sem::intrinsic::Intrinsic;
use crate::sem::Checked;
use arch::inst::Inst;
use arch::reg::Reg;
use indexmap::IndexMap;
use itertools::chain;
use std::collections::HashMap;

pub type Code = Vec<Line>;

/// Bytes between `$fp` and the caller's outgoing arguments (saved `$fp` and `$ra`).
const LINKAGE: i32 = 8;

/// A memory operand: `off(base)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Addr {
    base: Reg,
    off: i32,
}

impl Addr {
    fn new(base: Reg, off: i32) -> Self {
        Addr { base, off }
    }
}

/// Where an argument travels from caller to callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Reg(Reg),
    // offset from the caller's `$sp`, bytes to copy when passed by value
    Stack(i32, Option<usize>),
}

/// Argument passing plan for a parameter list, shared by caller and callee.
fn passing(params: &[Type], layouts: &StructLayouts) -> Result<(Vec<Pass>, usize), Error> {
    let mut plan = Vec::with_capacity(params.len());
    let mut stack = 0;
    for (i, ty) in params.iter().enumerate() {
        if i < Reg::ARGS.len() && is_word(ty) {
            plan.push(Pass::Reg(Reg::ARGS[i]));
        } else {
            let size = layouts.size_of(ty)?;
            let copy = ty.is_aggregate().then_some(size);
            plan.push(Pass::Stack(stack as i32, copy));
            stack += word_align(size);
        }
    }
    Ok((plan, stack))
}

pub struct FuncGen<'a> {
    checked: &'a Checked<'a>,
    layouts: &'a StructLayouts,
    strings: &'a IndexMap<NodeId, String>,
    labels: &'a mut usize,
    name: &'a str,
    regs: RegPool,
    frame: Frame,
    locals: HashMap<DeclId, i32>,
}

impl<'a> FuncGen<'a> {
    pub fn new(
        checked: &'a Checked<'a>,
        layouts: &'a StructLayouts,
        strings: &'a IndexMap<NodeId, String>,
        labels: &'a mut usize,
        name: &'a str,
    ) -> Self {
        FuncGen {
            checked,
            layouts,
            strings,
            labels,
            name,
            regs: RegPool::new(),
            frame: Frame::default(),
            locals: HashMap::new(),
        }
    }

    pub fn generate(mut self, fun: &FunDecl) -> Result<Code, Error> {
        let params: Vec<Type> = fun.params.iter().map(|p| p.ty.clone()).collect();
        let (plan, _) = passing(&params, self.layouts)?;

        let mut stores = Vec::new();
        for (param, pass) in fun.params.iter().zip(plan) {
            match pass {
                Pass::Reg(reg) => {
                    let off = self.frame.alloc(self.layouts.size_of(&param.ty)?);
                    self.locals.insert(param.id, off);
                    stores.push(store(&param.ty, reg, Addr::new(Reg::Fp, off)));
                }
                Pass::Stack(off, _) => {
                    self.locals.insert(param.id, LINKAGE + off);
                }
            }
        }

        let body = self.block(&fun.body)?;
        let size = self.frame.size() as i32;
        log::trace!("frame {}: {} bytes", self.name, size);

        let prologue = chain!(
            [
                Line::Label(self.name.to_string()),
                Line::Inst(Inst::Addi(Reg::Sp, Reg::Sp, -LINKAGE)),
                Line::Inst(Inst::Sw(Reg::Ra, 4, Reg::Sp)),
                Line::Inst(Inst::Sw(Reg::Fp, 0, Reg::Sp)),
                Line::Inst(Inst::Move(Reg::Fp, Reg::Sp)),
            ],
            (size > 0).then(|| Line::Inst(Inst::Addi(Reg::Sp, Reg::Sp, -size))),
            stores,
        );
        let epilogue = [
            Line::Label(ret_label(self.name)),
            Line::Inst(Inst::Move(Reg::Sp, Reg::Fp)),
            Line::Inst(Inst::Lw(Reg::Fp, 0, Reg::Sp)),
            Line::Inst(Inst::Lw(Reg::Ra, 4, Reg::Sp)),
            Line::Inst(Inst::Addi(Reg::Sp, Reg::Sp, LINKAGE)),
            Line::Inst(Inst::Jr(Reg::Ra)),
        ];
        Ok(chain!(prologue, body, epilogue).collect())
    }

    fn next_label(&mut self) -> usize {
        let n = *self.labels;
        *self.labels += 1;
        n
    }

    fn ty(&self, expr: &Expr) -> Result<&'a Type, Error> {
        self.checked
            .type_of(expr.id)
            .ok_or_else(|| Error::Internal(format!("untyped expression at {}", expr.pos)))
    }

    fn string_label(&self, id: NodeId) -> Result<String, Error> {
        self.strings
            .get_index_of(&id)
            .map(str_label)
            .ok_or_else(|| Error::Internal("string literal without label".to_string()))
    }

    fn free(&mut self, addr: Addr) {
        self.regs.release(addr.base);
    }
}

// Statements
impl<'a> FuncGen<'a> {
    fn block(&mut self, block: &Block) -> Result<Code, Error> {
        let mark = self.frame.mark();
        for var in &block.vars {
            let off = self.frame.alloc(self.layouts.size_of(&var.ty)?);
            self.locals.insert(var.id, off);
        }
        let mut code = Vec::new();
        for stmt in &block.stmts {
            code.extend(self.stmt(stmt)?);
        }
        self.frame.release(mark);
        Ok(code)
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<Code, Error> {
        match stmt {
            Stmt::Block(block) => self.block(block),
            Stmt::While(cond, body) => {
                let n = self.next_label();
                let (top, end) = (format!("__while_{n}"), format!("__endwhile_{n}"));
                let (cond, reg) = self.rvalue(cond)?;
                self.regs.release(reg);
                let body = self.stmt(body)?;
                Ok(chain!(
                    [Line::Label(top.clone())],
                    cond,
                    [Line::Inst(Inst::Beqz(reg, end.clone()))],
                    body,
                    [Line::Inst(Inst::J(top)), Line::Label(end)],
                )
                .collect())
            }
            Stmt::If(cond, then, els) => {
                let n = self.next_label();
                let (other, end) = (format!("__else_{n}"), format!("__endif_{n}"));
                let (cond, reg) = self.rvalue(cond)?;
                self.regs.release(reg);
                let then = self.stmt(then)?;
                let els = match els {
                    Some(els) => self.stmt(els)?,
                    None => Vec::new(),
                };
                Ok(chain!(
                    cond,
                    [Line::Inst(Inst::Beqz(reg, other.clone()))],
                    then,
                    [Line::Inst(Inst::J(end.clone())), Line::Label(other)],
                    els,
                    [Line::Label(end)],
                )
                .collect())
            }
            Stmt::Return(expr, _) => {
                let mut code = Vec::new();
                if let Some(expr) = expr {
                    let (value, reg) = self.rvalue(expr)?;
                    self.regs.release(reg);
                    code.extend(value);
                    code.push(Line::Inst(Inst::Move(Reg::V0, reg)));
                }
                code.push(Line::Inst(Inst::J(ret_label(self.name))));
                Ok(code)
            }
            Stmt::Assign(lhs, rhs) => {
                let ty = self.ty(lhs)?;
                let (value, reg) = self.rvalue(rhs)?;
                let (place, addr) = self.address(lhs)?;
                let write = match ty {
                    Type::Struct(_) => {
                        copy_bytes(Addr::new(reg, 0), addr, self.layouts.size_of(ty)?)
                    }
                    _ => vec![store(ty, reg, addr)],
                };
                self.free(addr);
                self.regs.release(reg);
                Ok(chain!(value, place, write).collect())
            }
            Stmt::Expr(expr) => {
                let (code, reg) = self.rvalue(expr)?;
                self.regs.release(reg);
                Ok(code)
            }
        }
    }
}

// Expressions
impl<'a> FuncGen<'a> {
    /// Evaluate into a fresh temporary. Aggregates evaluate to their address.
    fn rvalue(&mut self, expr: &Expr) -> Result<(Code, Reg), Error> {
        let ty = self.ty(expr)?;
        match &expr.kind {
            ExprKind::IntLiteral(value) => {
                let reg = self.regs.acquire()?;
                Ok((vec![Line::Inst(Inst::Li(reg, *value))], reg))
            }
            ExprKind::ChrLiteral(ch) => {
                let reg = self.regs.acquire()?;
                Ok((vec![Line::Inst(Inst::Li(reg, *ch as i32))], reg))
            }
            ExprKind::StrLiteral(_) => {
                let label = self.string_label(expr.id)?;
                let reg = self.regs.acquire()?;
                Ok((vec![Line::Inst(Inst::La(reg, label))], reg))
            }
            ExprKind::Var(_)
            | ExprKind::FieldAccess(..)
            | ExprKind::ArrayAccess(..)
            | ExprKind::ValueAt(_) => {
                let (code, addr) = self.address(expr)?;
                let (load, reg) = self.load(ty, addr)?;
                Ok((chain!(code, load).collect(), reg))
            }
            ExprKind::FunCall(name, args) => self.call(expr, name, args),
            ExprKind::BinOp(op, lhs, rhs) => self.binop(*op, lhs, rhs),
            ExprKind::SizeOf(of) => {
                let size = self.layouts.size_of(of)? as i32;
                let reg = self.regs.acquire()?;
                Ok((vec![Line::Inst(Inst::Li(reg, size))], reg))
            }
            // Every legal cast keeps the bit pattern
            ExprKind::TypeCast(_, inner) => self.rvalue(inner),
        }
    }

    /// Read the value of type `ty` stored at `addr`, consuming `addr`.
    fn load(&mut self, ty: &Type, addr: Addr) -> Result<(Code, Reg), Error> {
        if ty.is_aggregate() {
            return self.materialize(addr);
        }
        let reg = if Reg::TEMPS.contains(&addr.base) {
            addr.base
        } else {
            self.regs.acquire()?
        };
        let inst = match ty {
            Type::Char => Inst::Lb(reg, addr.off, addr.base),
            _ => Inst::Lw(reg, addr.off, addr.base),
        };
        Ok((vec![Line::Inst(inst)], reg))
    }

    /// Turn `off(base)` into an address held in a temporary.
    fn materialize(&mut self, addr: Addr) -> Result<(Code, Reg), Error> {
        if !Reg::TEMPS.contains(&addr.base) {
            let reg = self.regs.acquire()?;
            return Ok((vec![Line::Inst(Inst::Addi(reg, addr.base, addr.off))], reg));
        }
        let code = match addr.off {
            0 => vec![],
            off => vec![Line::Inst(Inst::Addi(addr.base, addr.base, off))],
        };
        Ok((code, addr.base))
    }

    /// Location of an lvalue, or of an aggregate temporary.
    fn address(&mut self, expr: &Expr) -> Result<(Code, Addr), Error> {
        match &expr.kind {
            ExprKind::Var(name) => {
                let bindings = self.checked.bindings();
                let decl = bindings
                    .decl_of(expr.id)
                    .ok_or_else(|| Error::Internal(format!("unbound variable {name}")))?;
                let scope = bindings.decl(decl).map(|info| info.scope);
                match scope {
                    Some(Scope::Global) => {
                        let reg = self.regs.acquire()?;
                        Ok((vec![Line::Inst(Inst::La(reg, name.clone()))], Addr::new(reg, 0)))
                    }
                    _ => {
                        let off = self
                            .locals
                            .get(&decl)
                            .copied()
                            .ok_or_else(|| Error::Internal(format!("no slot for {name}")))?;
                        Ok((vec![], Addr::new(Reg::Fp, off)))
                    }
                }
            }
            ExprKind::ValueAt(inner) => {
                let (code, reg) = self.rvalue(inner)?;
                Ok((code, Addr::new(reg, 0)))
            }
            ExprKind::FieldAccess(base, field) => {
                let Type::Struct(name) = self.ty(base)? else {
                    return Err(Error::Internal(format!("field {field} of non-struct")));
                };
                let off = self.layouts.offset_of(name, field)? as i32;
                let (code, addr) = self.address(base)?;
                Ok((code, Addr::new(addr.base, addr.off + off)))
            }
            ExprKind::ArrayAccess(base, index) => {
                let size = self.layouts.size_of(self.ty(expr)?)?;
                // Arrays evaluate to their address, pointers to their value
                let (base, reg) = self.rvalue(base)?;
                let (index, idx) = self.rvalue(index)?;
                let scale = match size {
                    1 => vec![],
                    size if size.is_power_of_two() => {
                        vec![Line::Inst(Inst::Sll(idx, idx, size.trailing_zeros() as i32))]
                    }
                    size => {
                        let tmp = self.regs.acquire()?;
                        self.regs.release(tmp);
                        vec![
                            Line::Inst(Inst::Li(tmp, size as i32)),
                            Line::Inst(Inst::Mul(idx, idx, tmp)),
                        ]
                    }
                };
                self.regs.release(idx);
                let code = chain!(base, index, scale, [Line::Inst(Inst::Add(reg, reg, idx))]);
                Ok((code.collect(), Addr::new(reg, 0)))
            }
            _ => {
                let (code, reg) = self.rvalue(expr)?;
                Ok((code, Addr::new(reg, 0)))
            }
        }
    }

    fn binop(&mut self, op: Op, lhs: &Expr, rhs: &Expr) -> Result<(Code, Reg), Error> {
        let aggregate = self.ty(lhs)?.is_aggregate();
        match op {
            Op::And | Op::Or => return self.logical(op, lhs, rhs),
            Op::Eq | Op::Ne if aggregate => return self.compare_bytes(op, lhs, rhs),
            _ => {}
        }
        let (left, a) = self.rvalue(lhs)?;
        let (right, b) = self.rvalue(rhs)?;
        self.regs.release(b);
        let inst = match op {
            Op::Add => Inst::Add(a, a, b),
            Op::Sub => Inst::Sub(a, a, b),
            Op::Mul => Inst::Mul(a, a, b),
            Op::Div => Inst::Div(a, a, b),
            Op::Mod => Inst::Rem(a, a, b),
            Op::Gt => Inst::Sgt(a, a, b),
            Op::Lt => Inst::Slt(a, a, b),
            Op::Ge => Inst::Sge(a, a, b),
            Op::Le => Inst::Sle(a, a, b),
            Op::Ne => Inst::Sne(a, a, b),
            Op::Eq => Inst::Seq(a, a, b),
            Op::And | Op::Or => unreachable!(),
        };
        Ok((chain!(left, right, [Line::Inst(inst)]).collect(), a))
    }

    /// `&&` and `||` skip the right operand once the result is known.
    fn logical(&mut self, op: Op, lhs: &Expr, rhs: &Expr) -> Result<(Code, Reg), Error> {
        let n = self.next_label();
        let (left, a) = self.rvalue(lhs)?;
        let (right, b) = self.rvalue(rhs)?;
        self.regs.release(b);
        let (end, skip): (String, fn(Reg, String) -> Inst) = match op {
            Op::And => (format!("__and_end_{n}"), Inst::Beqz),
            _ => (format!("__or_end_{n}"), Inst::Bnez),
        };
        let code = chain!(
            left,
            [Line::Inst(Inst::Sne(a, a, Reg::Zero)), Line::Inst(skip(a, end.clone()))],
            right,
            [Line::Inst(Inst::Sne(a, b, Reg::Zero)), Line::Label(end)],
        );
        Ok((code.collect(), a))
    }

    /// Equality of aggregates, byte by byte over the packed layout.
    fn compare_bytes(&mut self, op: Op, lhs: &Expr, rhs: &Expr) -> Result<(Code, Reg), Error> {
        let size = self.layouts.size_of(self.ty(lhs)?)?;
        let (left, a) = self.rvalue(lhs)?;
        let (right, b) = self.rvalue(rhs)?;
        self.regs.release(b);
        let mut code: Code = chain!(left, right).collect();
        code.push(Line::Inst(Inst::Li(Reg::V0, 1)));
        for i in 0..size as i32 {
            code.extend([
                Line::Inst(Inst::Lb(Reg::V1, i, a)),
                Line::Inst(Inst::Lb(Reg::A0, i, b)),
                Line::Inst(Inst::Seq(Reg::V1, Reg::V1, Reg::A0)),
                Line::Inst(Inst::Mul(Reg::V0, Reg::V0, Reg::V1)),
            ]);
        }
        code.push(Line::Inst(Inst::Move(a, Reg::V0)));
        if op == Op::Ne {
            code.push(Line::Inst(Inst::Seq(a, a, Reg::Zero)));
        }
        Ok((code, a))
    }

    fn call(&mut self, expr: &Expr, name: &str, args: &[Expr]) -> Result<(Code, Reg), Error> {
        let sig = self
            .checked
            .bindings()
            .call(expr.id)
            .ok_or_else(|| Error::Internal(format!("unbound call to {name}")))?;
        if let Some(intrinsic) = sig.intrinsic {
            return self.intrinsic(intrinsic, args);
        }
        let (plan, outgoing) = passing(&sig.params, self.layouts)?;
        let outgoing = outgoing as i32;

        // Temporaries held by the enclosing expression survive the call on the stack
        let saved = self.regs.live();
        let room = 4 * saved.len() as i32;
        let mut code = Vec::new();
        if room > 0 {
            code.push(Line::Inst(Inst::Addi(Reg::Sp, Reg::Sp, -room)));
            for (i, reg) in saved.iter().enumerate() {
                code.push(Line::Inst(Inst::Sw(*reg, 4 * i as i32, Reg::Sp)));
            }
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let (value, reg) = self.rvalue(arg)?;
            code.extend(value);
            values.push(reg);
        }
        if outgoing > 0 {
            code.push(Line::Inst(Inst::Addi(Reg::Sp, Reg::Sp, -outgoing)));
        }
        for (reg, pass) in values.iter().zip(plan) {
            match pass {
                Pass::Reg(to) => code.push(Line::Inst(Inst::Move(to, *reg))),
                Pass::Stack(off, None) => code.push(Line::Inst(Inst::Sw(*reg, off, Reg::Sp))),
                Pass::Stack(off, Some(size)) => {
                    code.extend(copy_bytes(Addr::new(*reg, 0), Addr::new(Reg::Sp, off), size))
                }
            }
        }
        for reg in values {
            self.regs.release(reg);
        }
        code.push(Line::Inst(Inst::Jal(name.to_string())));
        if outgoing > 0 {
            code.push(Line::Inst(Inst::Addi(Reg::Sp, Reg::Sp, outgoing)));
        }

        let reg = self.regs.acquire()?;
        match &sig.ret {
            // The callee hands back the address of its own copy; keep one in this frame
            ret @ Type::Struct(_) => {
                let size = self.layouts.size_of(ret)?;
                let slot = self.frame.alloc(size);
                code.extend(copy_bytes(
                    Addr::new(Reg::V0, 0),
                    Addr::new(Reg::Fp, slot),
                    size,
                ));
                code.push(Line::Inst(Inst::Addi(reg, Reg::Fp, slot)));
            }
            _ => code.push(Line::Inst(Inst::Move(reg, Reg::V0))),
        }

        if room > 0 {
            for (i, saved) in saved.iter().enumerate() {
                code.push(Line::Inst(Inst::Lw(*saved, 4 * i as i32, Reg::Sp)));
            }
            code.push(Line::Inst(Inst::Addi(Reg::Sp, Reg::Sp, room)));
        }
        Ok((code, reg))
    }

    fn intrinsic(&mut self, intrinsic: Intrinsic, args: &[Expr]) -> Result<(Code, Reg), Error> {
        let mut code = Vec::new();
        match (intrinsic, args.first()) {
            (Intrinsic::PrintS, Some(arg)) if matches!(arg.kind, ExprKind::StrLiteral(_)) => {
                code.push(Line::Inst(Inst::La(Reg::A0, self.string_label(arg.id)?)));
            }
            (_, Some(arg)) => {
                let (value, reg) = self.rvalue(arg)?;
                self.regs.release(reg);
                code.extend(value);
                code.push(Line::Inst(Inst::Move(Reg::A0, reg)));
            }
            (_, None) => {}
        }
        let reg = self.regs.acquire()?;
        code.extend([
            Line::Inst(Inst::Li(Reg::V0, intrinsic.syscall().code())),
            Line::Inst(Inst::Syscall),
            Line::Inst(Inst::Move(reg, Reg::V0)),
        ]);
        Ok((code, reg))
    }
}

fn store(ty: &Type, reg: Reg, addr: Addr) -> Line {
    match ty {
        Type::Char => Line::Inst(Inst::Sb(reg, addr.off, addr.base)),
        _ => Line::Inst(Inst::Sw(reg, addr.off, addr.base)),
    }
}

/// Copy `size` bytes through `$v1`.
fn copy_bytes(from: Addr, to: Addr, size: usize) -> Code {
    (0..size as i32)
        .flat_map(|i| {
            [
                Line::Inst(Inst::Lb(Reg::V1, from.off + i, from.base)),
                Line::Inst(Inst::Sb(Reg::V1, to.off + i, to.base)),
            ]
        })
        .collect()
}

pub fn ret_label(fun: &str) -> String {
    format!("__ret_{fun}")
}

pub fn str_label(id: usize) -> String {
    format!("__str_{id}")
}

use crate::{
    op::{Arg, OpKind},
    reg::Reg,
};

use color_print::cformat;
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    Li(Reg, i32),
    La(Reg, String),
    Move(Reg, Reg),

    Add(Reg, Reg, Reg),
    Addi(Reg, Reg, i32),
    Sub(Reg, Reg, Reg),
    Mul(Reg, Reg, Reg),
    Div(Reg, Reg, Reg),
    Rem(Reg, Reg, Reg),
    Sll(Reg, Reg, i32),

    Slt(Reg, Reg, Reg),
    Sle(Reg, Reg, Reg),
    Sgt(Reg, Reg, Reg),
    Sge(Reg, Reg, Reg),
    Seq(Reg, Reg, Reg),
    Sne(Reg, Reg, Reg),

    // rt, offset(base)
    Lw(Reg, i32, Reg),
    Sw(Reg, i32, Reg),
    Lb(Reg, i32, Reg),
    Sb(Reg, i32, Reg),

    Beqz(Reg, String),
    Bnez(Reg, String),
    J(String),
    Jal(String),
    Jr(Reg),
    Syscall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    Imm(i32),
    Label(String),
    Mem(i32, Reg),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown operation: `{0}`")]
    UnknownOperation(String),

    #[error("More argument required for `{0}`")]
    MissingArgument(OpKind),

    #[error("Too many arguments for `{0}`")]
    ExtraArgument(OpKind),

    #[error("Cannot parse `{0}` as {1}")]
    ParseArgument(String, &'static str),
}

impl Inst {
    pub fn kind(&self) -> OpKind {
        match self {
            Inst::Li(..) => OpKind::Li,
            Inst::La(..) => OpKind::La,
            Inst::Move(..) => OpKind::Move,
            Inst::Add(..) => OpKind::Add,
            Inst::Addi(..) => OpKind::Addi,
            Inst::Sub(..) => OpKind::Sub,
            Inst::Mul(..) => OpKind::Mul,
            Inst::Div(..) => OpKind::Div,
            Inst::Rem(..) => OpKind::Rem,
            Inst::Sll(..) => OpKind::Sll,
            Inst::Slt(..) => OpKind::Slt,
            Inst::Sle(..) => OpKind::Sle,
            Inst::Sgt(..) => OpKind::Sgt,
            Inst::Sge(..) => OpKind::Sge,
            Inst::Seq(..) => OpKind::Seq,
            Inst::Sne(..) => OpKind::Sne,
            Inst::Lw(..) => OpKind::Lw,
            Inst::Sw(..) => OpKind::Sw,
            Inst::Lb(..) => OpKind::Lb,
            Inst::Sb(..) => OpKind::Sb,
            Inst::Beqz(..) => OpKind::Beqz,
            Inst::Bnez(..) => OpKind::Bnez,
            Inst::J(..) => OpKind::J,
            Inst::Jal(..) => OpKind::Jal,
            Inst::Jr(..) => OpKind::Jr,
            Inst::Syscall => OpKind::Syscall,
        }
    }

    /// Operands in the order they are written, matching `OpKind::arg_field`.
    pub fn operands(&self) -> Vec<Operand> {
        use Operand as O;
        match self {
            Inst::Li(rd, imm) => vec![O::Reg(*rd), O::Imm(*imm)],
            Inst::La(rd, label) => vec![O::Reg(*rd), O::Label(label.clone())],
            Inst::Move(rd, rs) => vec![O::Reg(*rd), O::Reg(*rs)],
            Inst::Add(rd, rs, rt)
            | Inst::Sub(rd, rs, rt)
            | Inst::Mul(rd, rs, rt)
            | Inst::Div(rd, rs, rt)
            | Inst::Rem(rd, rs, rt)
            | Inst::Slt(rd, rs, rt)
            | Inst::Sle(rd, rs, rt)
            | Inst::Sgt(rd, rs, rt)
            | Inst::Sge(rd, rs, rt)
            | Inst::Seq(rd, rs, rt)
            | Inst::Sne(rd, rs, rt) => vec![O::Reg(*rd), O::Reg(*rs), O::Reg(*rt)],
            Inst::Addi(rd, rs, imm) | Inst::Sll(rd, rs, imm) => {
                vec![O::Reg(*rd), O::Reg(*rs), O::Imm(*imm)]
            }
            Inst::Lw(rt, off, base)
            | Inst::Sw(rt, off, base)
            | Inst::Lb(rt, off, base)
            | Inst::Sb(rt, off, base) => vec![O::Reg(*rt), O::Mem(*off, *base)],
            Inst::Beqz(rs, label) | Inst::Bnez(rs, label) => {
                vec![O::Reg(*rs), O::Label(label.clone())]
            }
            Inst::J(label) | Inst::Jal(label) => vec![O::Label(label.clone())],
            Inst::Jr(rs) => vec![O::Reg(*rs)],
            Inst::Syscall => vec![],
        }
    }

    fn assemble(kind: OpKind, ops: &[Operand]) -> Option<Inst> {
        use Operand as O;
        let inst = match (kind, ops) {
            (OpKind::Li, [O::Reg(rd), O::Imm(imm)]) => Inst::Li(*rd, *imm),
            (OpKind::La, [O::Reg(rd), O::Label(l)]) => Inst::La(*rd, l.clone()),
            (OpKind::Move, [O::Reg(rd), O::Reg(rs)]) => Inst::Move(*rd, *rs),
            (kind, [O::Reg(rd), O::Reg(rs), O::Reg(rt)]) => {
                let ctor = match kind {
                    OpKind::Add => Inst::Add,
                    OpKind::Sub => Inst::Sub,
                    OpKind::Mul => Inst::Mul,
                    OpKind::Div => Inst::Div,
                    OpKind::Rem => Inst::Rem,
                    OpKind::Slt => Inst::Slt,
                    OpKind::Sle => Inst::Sle,
                    OpKind::Sgt => Inst::Sgt,
                    OpKind::Sge => Inst::Sge,
                    OpKind::Seq => Inst::Seq,
                    OpKind::Sne => Inst::Sne,
                    _ => return None,
                };
                ctor(*rd, *rs, *rt)
            }
            (OpKind::Addi, [O::Reg(rd), O::Reg(rs), O::Imm(imm)]) => Inst::Addi(*rd, *rs, *imm),
            (OpKind::Sll, [O::Reg(rd), O::Reg(rs), O::Imm(imm)]) => Inst::Sll(*rd, *rs, *imm),
            (OpKind::Lw, [O::Reg(rt), O::Mem(off, base)]) => Inst::Lw(*rt, *off, *base),
            (OpKind::Sw, [O::Reg(rt), O::Mem(off, base)]) => Inst::Sw(*rt, *off, *base),
            (OpKind::Lb, [O::Reg(rt), O::Mem(off, base)]) => Inst::Lb(*rt, *off, *base),
            (OpKind::Sb, [O::Reg(rt), O::Mem(off, base)]) => Inst::Sb(*rt, *off, *base),
            (OpKind::Beqz, [O::Reg(rs), O::Label(l)]) => Inst::Beqz(*rs, l.clone()),
            (OpKind::Bnez, [O::Reg(rs), O::Label(l)]) => Inst::Bnez(*rs, l.clone()),
            (OpKind::J, [O::Label(l)]) => Inst::J(l.clone()),
            (OpKind::Jal, [O::Label(l)]) => Inst::Jal(l.clone()),
            (OpKind::Jr, [O::Reg(rs)]) => Inst::Jr(*rs),
            (OpKind::Syscall, []) => Inst::Syscall,
            _ => return None,
        };
        Some(inst)
    }
}

impl Operand {
    pub fn parse(arg: Arg, text: &str) -> Result<Operand, Error> {
        let text = text.trim();
        match arg {
            Arg::Rd | Arg::Rs | Arg::Rt => Reg::parse(text)
                .map(Operand::Reg)
                .map_err(|_| Error::ParseArgument(text.to_string(), "register")),
            Arg::Imm => parse_imm(text)
                .map(Operand::Imm)
                .ok_or_else(|| Error::ParseArgument(text.to_string(), "immediate")),
            Arg::Label => {
                if is_label(text) {
                    Ok(Operand::Label(text.to_string()))
                } else {
                    Err(Error::ParseArgument(text.to_string(), "label"))
                }
            }
            Arg::Mem => {
                let err = || Error::ParseArgument(text.to_string(), "offset(base)");
                let (off, rest) = text.split_once('(').ok_or_else(err)?;
                let base = rest.strip_suffix(')').ok_or_else(err)?;
                let off = match off.trim() {
                    "" => 0,
                    off => parse_imm(off).ok_or_else(err)?,
                };
                let base = Reg::parse(base).map_err(|_| err())?;
                Ok(Operand::Mem(off, base))
            }
        }
    }
}

/// Decimal (optionally signed) or `0x` hexadecimal.
pub fn parse_imm(text: &str) -> Option<i32> {
    let (neg, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    let value = if neg { -value } else { value };
    i32::try_from(value)
        .ok()
        .or_else(|| u32::try_from(value).ok().map(|v| v as i32))
}

pub fn is_label(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl FromStr for Inst {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let kind = OpKind::parse(name).map_err(|_| Error::UnknownOperation(name.to_string()))?;

        let args: Vec<&str> = rest
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        let fields = kind.arg_field();
        if args.len() < fields.len() {
            return Err(Error::MissingArgument(kind));
        }
        if args.len() > fields.len() {
            return Err(Error::ExtraArgument(kind));
        }

        let ops = fields
            .into_iter()
            .zip(args)
            .map(|(field, text)| Operand::parse(field, text))
            .collect::<Result<Vec<_>, _>>()?;
        Inst::assemble(kind, &ops).ok_or(Error::MissingArgument(kind))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{reg}"),
            Operand::Imm(imm) => write!(f, "{imm}"),
            Operand::Label(label) => write!(f, "{label}"),
            Operand::Mem(off, base) => write!(f, "{off}({base})"),
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops = self.operands();
        if ops.is_empty() {
            write!(f, "{}", self.kind())
        } else {
            write!(f, "{} {}", self.kind(), ops.iter().join(", "))
        }
    }
}

impl Inst {
    pub fn cformat(&self) -> String {
        let ops = self
            .operands()
            .iter()
            .map(|op| match op {
                Operand::Reg(reg) => cformat!("<b>{}</>", reg),
                Operand::Imm(imm) => cformat!("<y>{}</>", imm),
                Operand::Label(label) => cformat!("<g>{}</>", label),
                Operand::Mem(off, base) => cformat!("<y>{}</>(<b>{}</>)", off, base),
            })
            .join(", ");
        cformat!("<r>{:<8}</>{}", self.kind().to_string(), ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_inst {
        ($($name:ident: $inst:expr => $text:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let inst = $inst;
                    assert_eq!(inst.to_string(), $text);
                    let inst_back: Inst = $text.parse().unwrap();
                    assert_eq!(inst, inst_back);
                }
            )*
        }
    }

    test_inst! {
        test_li: Inst::Li(Reg::V0, 10) => "li $v0, 10",
        test_li_neg: Inst::Li(Reg::T0, -42) => "li $t0, -42",
        test_la: Inst::La(Reg::A0, "str_0".to_string()) => "la $a0, str_0",
        test_move: Inst::Move(Reg::Fp, Reg::Sp) => "move $fp, $sp",
        test_add: Inst::Add(Reg::T0, Reg::T1, Reg::T2) => "add $t0, $t1, $t2",
        test_addi: Inst::Addi(Reg::Sp, Reg::Sp, -8) => "addi $sp, $sp, -8",
        test_mul: Inst::Mul(Reg::T0, Reg::T0, Reg::S7) => "mul $t0, $t0, $s7",
        test_sll: Inst::Sll(Reg::T1, Reg::T1, 2) => "sll $t1, $t1, 2",
        test_sge: Inst::Sge(Reg::T0, Reg::T1, Reg::T2) => "sge $t0, $t1, $t2",
        test_lw: Inst::Lw(Reg::Ra, 4, Reg::Sp) => "lw $ra, 4($sp)",
        test_sb: Inst::Sb(Reg::T3, -13, Reg::Fp) => "sb $t3, -13($fp)",
        test_beqz: Inst::Beqz(Reg::T0, "else_3".to_string()) => "beqz $t0, else_3",
        test_jal: Inst::Jal("main".to_string()) => "jal main",
        test_jr: Inst::Jr(Reg::Ra) => "jr $ra",
        test_syscall: Inst::Syscall => "syscall",
    }

    #[test]
    fn test_parse_loose() {
        assert_eq!("lw $t0,($t1)".parse(), Ok(Inst::Lw(Reg::T0, 0, Reg::T1)));
        assert_eq!("LI $t0, 0x10".parse(), Ok(Inst::Li(Reg::T0, 16)));
    }

    #[test]
    fn test_parse_error() {
        assert_eq!(
            "hoge $t0".parse::<Inst>(),
            Err(Error::UnknownOperation("hoge".to_string()))
        );
        assert_eq!(
            "add $t0, $t1".parse::<Inst>(),
            Err(Error::MissingArgument(OpKind::Add))
        );
        assert_eq!(
            "jr $ra, $t0".parse::<Inst>(),
            Err(Error::ExtraArgument(OpKind::Jr))
        );
        assert!("lw $t0, 4".parse::<Inst>().is_err());
        assert!("j 3abc".parse::<Inst>().is_err());
    }
}

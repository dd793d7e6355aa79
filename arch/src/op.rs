use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OpKind {
    Li,
    La,
    Move,
    Add,
    Addi,
    Sub,
    Mul,
    Div,
    Rem,
    Slt,
    Sle,
    Sgt,
    Sge,
    Seq,
    Sne,
    Sll,
    Lw,
    Sw,
    Lb,
    Sb,
    Beqz,
    Bnez,
    J,
    Jal,
    Jr,
    Syscall,
}

impl OpKind {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().parse::<Self>() {
            Ok(a) => Ok(a),
            Err(_) => Err(format!("Undefined Op: {s}")),
        }
    }
}

/// Operand shape of one argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Rd,
    Rs,
    Rt,
    Imm,
    Label,
    /// `offset(base)`
    Mem,
}

impl OpKind {
    pub fn arg_field(&self) -> Vec<Arg> {
        use OpKind::*;
        match self {
            Li => vec![Arg::Rd, Arg::Imm],
            La => vec![Arg::Rd, Arg::Label],
            Move => vec![Arg::Rd, Arg::Rs],
            Add | Sub | Mul | Div | Rem => vec![Arg::Rd, Arg::Rs, Arg::Rt],
            Slt | Sle | Sgt | Sge | Seq | Sne => vec![Arg::Rd, Arg::Rs, Arg::Rt],
            Addi | Sll => vec![Arg::Rd, Arg::Rs, Arg::Imm],
            Lw | Sw | Lb | Sb => vec![Arg::Rt, Arg::Mem],
            Beqz | Bnez => vec![Arg::Rs, Arg::Label],
            J | Jal => vec![Arg::Label],
            Jr => vec![Arg::Rs],
            Syscall => vec![],
        }
    }
}

#[test]
fn test() {
    assert_eq!(OpKind::Addi.to_string(), "addi");
    assert_eq!(OpKind::parse("SYSCALL"), Ok(OpKind::Syscall));
    assert_eq!(OpKind::parse("lw").map(|k| k.arg_field().len()), Ok(2));
    assert!(OpKind::parse("hoge").is_err());
}

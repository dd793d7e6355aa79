use crate::grammer::ast::Type;
use arch::syscall::Syscall;
use strum::{AsRefStr, EnumIter, EnumString};

/// Built-in functions lowered straight to a syscall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, EnumIter)]
pub enum Intrinsic {
    #[strum(serialize = "print_s")]
    PrintS,
    #[strum(serialize = "print_i")]
    PrintI,
    #[strum(serialize = "print_c")]
    PrintC,
    #[strum(serialize = "read_i")]
    ReadI,
    #[strum(serialize = "read_c")]
    ReadC,
    #[strum(serialize = "mcmalloc")]
    McMalloc,
}

impl Intrinsic {
    /// (return type, parameter types)
    pub fn signature(&self) -> (Type, Vec<Type>) {
        match self {
            Intrinsic::PrintS => (Type::Void, vec![Type::pointer(Type::Char)]),
            Intrinsic::PrintI => (Type::Void, vec![Type::Int]),
            Intrinsic::PrintC => (Type::Void, vec![Type::Char]),
            Intrinsic::ReadI => (Type::Int, vec![]),
            Intrinsic::ReadC => (Type::Char, vec![]),
            Intrinsic::McMalloc => (Type::pointer(Type::Void), vec![Type::Int]),
        }
    }

    pub fn syscall(&self) -> Syscall {
        match self {
            Intrinsic::PrintS => Syscall::PrintString,
            Intrinsic::PrintI => Syscall::PrintInt,
            Intrinsic::PrintC => Syscall::PrintChar,
            Intrinsic::ReadI => Syscall::ReadInt,
            Intrinsic::ReadC => Syscall::ReadChar,
            Intrinsic::McMalloc => Syscall::Sbrk,
        }
    }
}

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum::Display;

/// Service numbers placed in `$v0` before `syscall` (MARS/SPIM numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive, Display)]
#[repr(i32)]
pub enum Syscall {
    PrintInt = 1,
    PrintString = 4,
    ReadInt = 5,
    Sbrk = 9,
    Exit = 10,
    PrintChar = 11,
    ReadChar = 12,
}

impl Syscall {
    pub fn code(self) -> i32 {
        self.into()
    }
}

#[test]
fn test_codes() {
    assert_eq!(Syscall::PrintInt.code(), 1);
    assert_eq!(Syscall::try_from(10).ok(), Some(Syscall::Exit));
    assert!(Syscall::try_from(2).is_err());
}

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Loading
    #[error("line {0}: {1}")]
    Inst(usize, #[source] arch::inst::Error),

    #[error("line {0}: bad directive `{1}`")]
    Directive(usize, String),

    #[error("line {0}: `{1}` is not allowed in this section")]
    Misplaced(usize, String),

    #[error("line {0}: duplicate label `{1}`")]
    DuplicateLabel(usize, String),

    #[error("Unknown label `{0}`")]
    UnknownLabel(String),

    // Execution
    #[error("Bad memory access at 0x{0:08x}")]
    MemoryAccess(u32),

    #[error("Program counter left the text segment: 0x{0:08x}")]
    PcOutOfRange(u32),

    #[error("Division by zero at 0x{0:08x}")]
    DivisionByZero(u32),

    #[error("Unknown syscall {0}")]
    UnknownSyscall(i32),

    #[error("Integer input out of range: {0}")]
    IntRange(String),

    #[error("No more input")]
    EndOfInput,

    #[error("Not terminated within {0} steps")]
    StepLimit(u64),

    // Driver
    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] io::Error),

    #[error("Bad dump config {0}")]
    DumpConfig(String, #[source] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

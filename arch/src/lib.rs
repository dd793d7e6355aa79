pub mod inst;
pub mod op;
pub mod reg;
pub mod syscall;

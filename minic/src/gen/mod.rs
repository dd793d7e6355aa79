pub mod asm;
pub mod codegen;
pub mod frame;
pub mod func;
pub mod layout;
pub mod regpool;

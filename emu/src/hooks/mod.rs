pub mod dump;
pub mod trace;

use crate::model::State;
use arch::inst::Inst;

/// Side effects run around every executed instruction.
pub trait Hook {
    fn init(&mut self, state: State) -> State {
        state
    }
    fn exec(&mut self, time: u64, addr: u32, inst: &Inst, state: State) -> State;
}

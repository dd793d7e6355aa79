use super::Hook;
use crate::model::State;
use arch::inst::Inst;
use color_print::cprintln;

/// Listing of every executed instruction.
pub struct Trace;

impl Hook for Trace {
    fn init(&mut self, state: State) -> State {
        println!(" * Trace");
        state
    }

    fn exec(&mut self, time: u64, addr: u32, inst: &Inst, state: State) -> State {
        if let Some(label) = state.program().label_at(addr) {
            cprintln!("         <g,bold>{}</>:", label);
        }
        cprintln!("<s>[{:0>6}]</> {:0>8X}  {}", time, addr, inst.cformat());
        state
    }
}

pub mod console;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod memory;
pub mod model;

pub use error::Error;

use console::Console;
use hooks::Hook;
use model::State;

/// Run until the program exits, at most `tmax` instructions.
pub fn run(
    mut state: State,
    console: &mut dyn Console,
    hooks: &mut [Box<dyn Hook>],
    tmax: Option<u64>,
) -> Result<State, Error> {
    state = hooks.iter_mut().fold(state, |state, hook| hook.init(state));
    let limit = tmax.unwrap_or(u64::MAX);
    for time in 0..limit {
        let (addr, inst) = state.exec(console)?;
        state = hooks
            .iter_mut()
            .fold(state, |state, hook| hook.exec(time, addr, &inst, state));
        if state.is_terminated() {
            log::debug!("terminated after {} steps", time + 1);
            return Ok(state);
        }
    }
    Err(Error::StepLimit(limit))
}

/// Assemble `source` and run it against `console`.
pub fn run_source(source: &str, console: &mut dyn Console, tmax: Option<u64>) -> Result<State, Error> {
    let program = loader::load(source)?;
    run(State::new(program), console, &mut [], tmax)
}

#[cfg(test)]
mod tests {
    use super::*;
    use console::BufferConsole;

    #[test]
    fn test_step_limit() {
        let mut console = BufferConsole::default();
        let result = run_source("top: j top\n", &mut console, Some(100));
        assert!(matches!(result, Err(Error::StepLimit(100))));
    }

    #[test]
    fn test_exit_syscall() {
        let mut console = BufferConsole::default();
        let state = run_source("li $v0, 10\nsyscall\nli $t0, 1\n", &mut console, None).unwrap();
        assert_eq!(state.get(arch::reg::Reg::T0), 0);
    }
}

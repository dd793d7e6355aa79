use super::Hook;
use crate::error::Error;
use crate::model::State;
use arch::inst::Inst;
use arch::reg::Reg;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use strum::IntoEnumIterator;

/// Prints registers (and optionally the current frame) when execution passes a label.
#[derive(Debug)]
pub struct Dump {
    file: Option<String>,
    all: bool,
    list: List,
    points: HashMap<u32, Config>,
}

/// label -> what to print there
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct List(HashMap<String, Config>);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Registers to show; all of them when empty
    #[serde(default)]
    regs: Vec<Reg>,
    #[serde(default)]
    stack: bool,
}

impl Dump {
    pub fn arg(file: Option<String>, all: bool) -> Result<Self, Error> {
        let list = match &file {
            Some(fname) => {
                let reader = File::open(fname).map_err(|e| Error::FileOpen(fname.clone(), e))?;
                serde_yaml::from_reader(BufReader::new(reader))
                    .map_err(|e| Error::DumpConfig(fname.clone(), e))?
            }
            None => List::default(),
        };
        Ok(Self::new(file, all, list))
    }

    pub fn new(file: Option<String>, all: bool, list: List) -> Self {
        Dump {
            file,
            all,
            list,
            points: HashMap::new(),
        }
    }
}

impl Hook for Dump {
    fn init(&mut self, state: State) -> State {
        if self.all {
            println!(" * Dump all");
        }
        if let Some(fname) = &self.file {
            println!(" * Dump[{}] {:?}", self.list.0.len(), fname);
        }
        for (label, cfg) in &self.list.0 {
            match state.program().address(label) {
                Ok(addr) => {
                    self.points.insert(addr, cfg.clone());
                }
                Err(err) => log::warn!("dump point ignored: {err}"),
            }
        }
        state
    }

    fn exec(&mut self, _time: u64, addr: u32, _inst: &Inst, state: State) -> State {
        if let Some(cfg) = self.points.get(&addr) {
            if let Some(label) = state.program().label_at(addr) {
                println!(" {label}:");
            }
            print_reg(&state, &cfg.regs);
            if cfg.stack {
                print_stack(&state);
            }
        } else if self.all {
            print_reg(&state, &[]);
        }
        state
    }
}

fn print_reg(state: &State, regs: &[Reg]) {
    let regs: Vec<Reg> = match regs {
        [] => Reg::iter().collect(),
        regs => regs.to_vec(),
    };
    println!(" +{}+", "-".repeat(71));
    for row in &regs.iter().chunks(4) {
        let cells = row
            .map(|reg| format!("{:>5}: {:0>8X}", reg.to_string(), state.get(*reg)))
            .join(" | ");
        println!(" | {:<69} |", cells);
    }
    println!(" +{}+", "-".repeat(71));
}

fn print_stack(state: &State) {
    let sp = state.get(Reg::Sp) as u32;
    let fp = state.get(Reg::Fp) as u32;
    for addr in (sp..fp.saturating_add(8)).step_by(4) {
        let word = state
            .mem
            .load_word(addr)
            .map(|w| format!("{w:0>8X}"))
            .unwrap_or_else(|_| "--------".to_string());
        let mark = match addr {
            a if a == sp => "<- $sp",
            a if a == fp => "<- $fp",
            _ => "",
        };
        println!(" | {addr:0>8X} : {word} {mark:<50} |");
    }
    println!(" +{}+", "-".repeat(71));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_yaml() {
        let list: List =
            serde_yaml::from_str("main:\n  regs: [t0, sp]\n  stack: true\n__exit: {}\n").unwrap();
        assert_eq!(list.0["main"].regs, vec![Reg::T0, Reg::Sp]);
        assert!(list.0["main"].stack);
        assert!(list.0["__exit"].regs.is_empty());
    }
}

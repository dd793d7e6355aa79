use crate::console::Console;
use crate::error::Error;
use crate::loader::{Program, TEXT_BASE};
use crate::memory::Memory;
use arch::inst::Inst;
use arch::reg::Reg;
use arch::syscall::Syscall;

pub struct State {
    program: Program,
    regs: [i32; 32],
    pc: u32,
    pub mem: Memory,
    terminated: bool,
}

// Register access
impl State {
    pub fn get(&self, reg: Reg) -> i32 {
        self.regs[u8::from(reg) as usize]
    }

    pub fn set(&mut self, reg: Reg, val: i32) {
        if reg != Reg::Zero {
            self.regs[u8::from(reg) as usize] = val;
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    fn addr(&self, base: Reg, off: i32) -> u32 {
        self.get(base).wrapping_add(off) as u32
    }
}

impl State {
    pub fn new(program: Program) -> Self {
        let mem = Memory::new(program.data.clone());
        let mut state = State {
            program,
            regs: [0; 32],
            pc: TEXT_BASE,
            mem,
            terminated: false,
        };
        state.set(Reg::Sp, Memory::STACK_TOP as i32);
        state.set(Reg::Fp, Memory::STACK_TOP as i32);
        state.set(Reg::Gp, 0x1000_8000);
        state
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Execute one instruction; returns its address and the instruction.
    pub fn exec(&mut self, console: &mut dyn Console) -> Result<(u32, Inst), Error> {
        let pc = self.pc;
        if pc == self.program.text_end() {
            // Running off the end of the text segment exits like MARS does
            self.terminated = true;
            return Ok((pc, Inst::Syscall));
        }
        let inst = self
            .program
            .inst_at(pc)
            .cloned()
            .ok_or(Error::PcOutOfRange(pc))?;
        self.pc = pc.wrapping_add(4);

        match &inst {
            Inst::Li(rd, imm) => self.set(*rd, *imm),
            Inst::La(rd, label) => {
                let addr = self.program.address(label)?;
                self.set(*rd, addr as i32);
            }
            Inst::Move(rd, rs) => self.set(*rd, self.get(*rs)),
            Inst::Add(rd, rs, rt) => self.calc(*rd, *rs, *rt, i32::wrapping_add),
            Inst::Sub(rd, rs, rt) => self.calc(*rd, *rs, *rt, i32::wrapping_sub),
            Inst::Mul(rd, rs, rt) => self.calc(*rd, *rs, *rt, i32::wrapping_mul),
            Inst::Div(rd, rs, rt) | Inst::Rem(rd, rs, rt) => {
                let divisor = self.get(*rt);
                if divisor == 0 {
                    return Err(Error::DivisionByZero(pc));
                }
                let value = match inst {
                    Inst::Div(..) => self.get(*rs).wrapping_div(divisor),
                    _ => self.get(*rs).wrapping_rem(divisor),
                };
                self.set(*rd, value);
            }
            Inst::Addi(rd, rs, imm) => self.set(*rd, self.get(*rs).wrapping_add(*imm)),
            Inst::Sll(rd, rs, imm) => self.set(*rd, self.get(*rs).wrapping_shl(*imm as u32)),
            Inst::Slt(rd, rs, rt) => self.calc(*rd, *rs, *rt, |a, b| (a < b) as i32),
            Inst::Sle(rd, rs, rt) => self.calc(*rd, *rs, *rt, |a, b| (a <= b) as i32),
            Inst::Sgt(rd, rs, rt) => self.calc(*rd, *rs, *rt, |a, b| (a > b) as i32),
            Inst::Sge(rd, rs, rt) => self.calc(*rd, *rs, *rt, |a, b| (a >= b) as i32),
            Inst::Seq(rd, rs, rt) => self.calc(*rd, *rs, *rt, |a, b| (a == b) as i32),
            Inst::Sne(rd, rs, rt) => self.calc(*rd, *rs, *rt, |a, b| (a != b) as i32),
            Inst::Lw(rt, off, base) => {
                let value = self.mem.load_word(self.addr(*base, *off))?;
                self.set(*rt, value);
            }
            Inst::Lb(rt, off, base) => {
                let value = self.mem.load_byte(self.addr(*base, *off))? as i8;
                self.set(*rt, value as i32);
            }
            Inst::Sw(rt, off, base) => {
                self.mem.store_word(self.addr(*base, *off), self.get(*rt))?;
            }
            Inst::Sb(rt, off, base) => {
                self.mem.store_byte(self.addr(*base, *off), self.get(*rt) as u8)?;
            }
            Inst::Beqz(rs, label) => {
                if self.get(*rs) == 0 {
                    self.pc = self.program.address(label)?;
                }
            }
            Inst::Bnez(rs, label) => {
                if self.get(*rs) != 0 {
                    self.pc = self.program.address(label)?;
                }
            }
            Inst::J(label) => self.pc = self.program.address(label)?,
            Inst::Jal(label) => {
                self.set(Reg::Ra, self.pc as i32);
                self.pc = self.program.address(label)?;
            }
            Inst::Jr(rs) => self.pc = self.get(*rs) as u32,
            Inst::Syscall => self.syscall(console)?,
        }
        Ok((pc, inst))
    }

    fn calc(&mut self, rd: Reg, rs: Reg, rt: Reg, op: impl Fn(i32, i32) -> i32) {
        self.set(rd, op(self.get(rs), self.get(rt)));
    }

    fn syscall(&mut self, console: &mut dyn Console) -> Result<(), Error> {
        let code = self.get(Reg::V0);
        let call = Syscall::try_from(code).map_err(|_| Error::UnknownSyscall(code))?;
        let arg = self.get(Reg::A0);
        match call {
            Syscall::PrintInt => console.write(&arg.to_string())?,
            Syscall::PrintString => {
                let text = self.mem.load_string(arg as u32)?;
                console.write(&text)?;
            }
            Syscall::PrintChar => console.write(&(arg as u8 as char).to_string())?,
            Syscall::ReadInt => {
                let value = console.read_int()?;
                self.set(Reg::V0, value);
            }
            Syscall::ReadChar => {
                let ch = console.read_char()?;
                self.set(Reg::V0, ch as i32);
            }
            Syscall::Sbrk => {
                let addr = self.mem.sbrk(arg)?;
                self.set(Reg::V0, addr as i32);
            }
            Syscall::Exit => self.terminated = true,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::BufferConsole;
    use crate::loader::load;

    fn run(source: &str, input: &str) -> (State, String) {
        let mut state = State::new(load(source).unwrap());
        let mut console = BufferConsole::new(input);
        for _ in 0..10_000 {
            state.exec(&mut console).unwrap();
            if state.is_terminated() {
                break;
            }
        }
        assert!(state.is_terminated());
        (state, console.output)
    }

    #[test]
    fn test_arith_and_print() {
        let (state, out) = run(
            "li $t0, 6\nli $t1, 7\nmul $t2, $t0, $t1\nmove $a0, $t2\nli $v0, 1\nsyscall\nli $v0, 10\nsyscall\n",
            "",
        );
        assert_eq!(out, "42");
        assert_eq!(state.get(Reg::T2), 42);
    }

    #[test]
    fn test_zero_register() {
        let (state, _) = run("li $zero, 5\n", "");
        assert_eq!(state.get(Reg::Zero), 0);
    }

    #[test]
    fn test_call_and_return() {
        let (state, _) = run(
            "jal f\nj end\nf: li $v0, 3\njr $ra\nend: move $t0, $v0\n",
            "",
        );
        assert_eq!(state.get(Reg::T0), 3);
    }

    #[test]
    fn test_byte_sign_extension() {
        let (state, _) = run(
            "addi $sp, $sp, -4\nli $t0, -2\nsb $t0, 0($sp)\nlb $t1, 0($sp)\n",
            "",
        );
        assert_eq!(state.get(Reg::T1), -2);
    }

    #[test]
    fn test_loop_and_strings() {
        let (_, out) = run(
            ".data\nmsg: .asciiz \"n=\"\n.text\n\
             li $v0, 5\nsyscall\nmove $t0, $v0\n\
             top: beqz $t0, done\n\
             la $a0, msg\nli $v0, 4\nsyscall\nmove $a0, $t0\nli $v0, 1\nsyscall\n\
             addi $t0, $t0, -1\nj top\n\
             done: li $v0, 10\nsyscall\n",
            "2\n",
        );
        assert_eq!(out, "n=2n=1");
    }

    #[test]
    fn test_division_by_zero() {
        let mut state = State::new(load("li $t0, 1\ndiv $t1, $t0, $zero\n").unwrap());
        let mut console = BufferConsole::default();
        state.exec(&mut console).unwrap();
        assert!(matches!(
            state.exec(&mut console),
            Err(Error::DivisionByZero(pc)) if pc == TEXT_BASE + 4
        ));
    }
}

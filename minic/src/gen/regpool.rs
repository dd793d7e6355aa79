use crate::error::Error;
use arch::reg::Reg;

/// Free list of temporaries. Registers are handed out in `Reg::TEMPS` order.
#[derive(Debug, Clone)]
pub struct RegPool {
    free: Vec<Reg>,
}

impl Default for RegPool {
    fn default() -> Self {
        Self::new()
    }
}

impl RegPool {
    pub fn new() -> Self {
        RegPool {
            free: Reg::TEMPS.iter().rev().copied().collect(),
        }
    }

    pub fn acquire(&mut self) -> Result<Reg, Error> {
        let reg = self.free.pop().ok_or(Error::OutOfRegisters(Reg::TEMPS.len()))?;
        log::trace!("acquire {reg}");
        Ok(reg)
    }

    pub fn release(&mut self, reg: Reg) {
        if Reg::TEMPS.contains(&reg) && !self.free.contains(&reg) {
            log::trace!("release {reg}");
            self.free.push(reg);
        }
    }

    /// Temporaries currently holding a value
    pub fn live(&self) -> Vec<Reg> {
        Reg::TEMPS
            .iter()
            .filter(|reg| !self.free.contains(reg))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_order() {
        let mut pool = RegPool::new();
        assert_eq!(pool.acquire().unwrap(), Reg::T0);
        assert_eq!(pool.acquire().unwrap(), Reg::T1);
        assert_eq!(pool.live(), vec![Reg::T0, Reg::T1]);
    }

    #[test]
    fn test_release_reuses() {
        let mut pool = RegPool::new();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.release(b);
        assert_eq!(pool.acquire().unwrap(), b);
        pool.release(a);
        pool.release(a);
        pool.release(Reg::Fp);
        assert_eq!(pool.live(), vec![b]);
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = RegPool::new();
        for _ in 0..18 {
            pool.acquire().unwrap();
        }
        assert!(matches!(pool.acquire(), Err(Error::OutOfRegisters(18))));
    }
}

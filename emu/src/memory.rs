use crate::error::Error;

/// Byte-addressable little-endian memory: a static data segment that grows
/// upward through `sbrk`, and a stack segment just below `STACK_END`.
/// Word accesses need not be aligned.
#[derive(Debug, Clone)]
pub struct Memory {
    data: Vec<u8>,
    stack: Vec<u8>,
}

impl Memory {
    pub const DATA_BASE: u32 = 0x1001_0000;
    pub const STACK_END: u32 = 0x8000_0000;
    pub const STACK_SIZE: usize = 0x10_0000;
    /// Initial `$sp`
    pub const STACK_TOP: u32 = 0x7fff_effc;

    pub fn new(data: Vec<u8>) -> Self {
        Memory {
            data,
            stack: vec![0; Self::STACK_SIZE],
        }
    }

    fn stack_base() -> u32 {
        Self::STACK_END - Self::STACK_SIZE as u32
    }

    fn index(&self, addr: u32) -> Option<(bool, usize)> {
        if addr >= Self::DATA_BASE && ((addr - Self::DATA_BASE) as usize) < self.data.len() {
            return Some((false, (addr - Self::DATA_BASE) as usize));
        }
        if addr >= Self::stack_base() && addr < Self::STACK_END {
            return Some((true, (addr - Self::stack_base()) as usize));
        }
        None
    }

    pub fn load_byte(&self, addr: u32) -> Result<u8, Error> {
        match self.index(addr) {
            Some((false, idx)) => Ok(self.data[idx]),
            Some((true, idx)) => Ok(self.stack[idx]),
            None => Err(Error::MemoryAccess(addr)),
        }
    }

    pub fn store_byte(&mut self, addr: u32, value: u8) -> Result<(), Error> {
        match self.index(addr) {
            Some((false, idx)) => self.data[idx] = value,
            Some((true, idx)) => self.stack[idx] = value,
            None => return Err(Error::MemoryAccess(addr)),
        }
        Ok(())
    }

    pub fn load_word(&self, addr: u32) -> Result<i32, Error> {
        let mut bytes = [0; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.load_byte(addr.wrapping_add(i as u32))?;
        }
        Ok(i32::from_le_bytes(bytes))
    }

    pub fn store_word(&mut self, addr: u32, value: i32) -> Result<(), Error> {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.store_byte(addr.wrapping_add(i as u32), byte)?;
        }
        Ok(())
    }

    /// Bytes up to the first NUL.
    pub fn load_string(&self, addr: u32) -> Result<String, Error> {
        let mut bytes = Vec::new();
        let mut addr = addr;
        loop {
            match self.load_byte(addr)? {
                0 => break,
                byte => bytes.push(byte),
            }
            addr = addr.wrapping_add(1);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Current end of the data segment
    pub fn brk(&self) -> u32 {
        Self::DATA_BASE + self.data.len() as u32
    }

    /// Grow the data segment by `size` bytes and return the old end.
    pub fn sbrk(&mut self, size: i32) -> Result<u32, Error> {
        let old = self.brk();
        let size = usize::try_from(size).map_err(|_| Error::MemoryAccess(old))?;
        if self.data.len() + size > (Self::stack_base() - Self::DATA_BASE) as usize {
            return Err(Error::MemoryAccess(old));
        }
        self.data.resize(self.data.len() + size, 0);
        Ok(old)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unaligned_word() {
        let mut mem = Memory::new(vec![0; 8]);
        mem.store_word(Memory::DATA_BASE + 1, 0x1234_5678).unwrap();
        assert_eq!(mem.load_byte(Memory::DATA_BASE + 1).unwrap(), 0x78);
        assert_eq!(mem.load_word(Memory::DATA_BASE + 1).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_stack_segment() {
        let mut mem = Memory::new(vec![]);
        mem.store_word(Memory::STACK_TOP, -1).unwrap();
        assert_eq!(mem.load_word(Memory::STACK_TOP).unwrap(), -1);
        assert!(matches!(
            mem.load_byte(Memory::STACK_END),
            Err(Error::MemoryAccess(_))
        ));
    }

    #[test]
    fn test_sbrk() {
        let mut mem = Memory::new(vec![1, 2]);
        assert_eq!(mem.sbrk(8).unwrap(), Memory::DATA_BASE + 2);
        assert_eq!(mem.brk(), Memory::DATA_BASE + 10);
        mem.store_word(Memory::DATA_BASE + 6, 7).unwrap();
        assert!(mem.load_byte(Memory::DATA_BASE + 10).is_err());
    }

    #[test]
    fn test_string() {
        let mem = Memory::new(b"hi\0".to_vec());
        assert_eq!(mem.load_string(Memory::DATA_BASE).unwrap(), "hi");
    }
}

//! In-memory register file for exercising drivers off-target.

extern crate alloc;

use crate::{RegisterBus, RegisterWidth};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::cell::RefCell;

/// A sparse register file. Unwritten registers read as zero; every write is
/// also appended to a log so tests can check ordering and FIFO pushes.
#[derive(Debug, Default)]
pub struct RegisterFile {
    regs: RefCell<BTreeMap<usize, u64>>,
    writes: RefCell<Vec<(usize, u64)>>,
}

impl RegisterFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Presets a register without recording a write.
    pub fn preset<T: RegisterWidth>(&self, offset: usize, value: T) {
        self.regs.borrow_mut().insert(offset, value.to_raw());
    }

    /// Current raw value of the register at `offset`.
    #[must_use]
    pub fn peek(&self, offset: usize) -> u64 {
        self.regs.borrow().get(&offset).copied().unwrap_or(0)
    }

    /// All writes so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<(usize, u64)> {
        self.writes.borrow().clone()
    }

    /// Values written to `offset`, oldest first.
    #[must_use]
    pub fn writes_to(&self, offset: usize) -> Vec<u64> {
        self.writes
            .borrow()
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn clear_log(&self) {
        self.writes.borrow_mut().clear();
    }
}

impl RegisterBus for RegisterFile {
    fn read<T: RegisterWidth>(&self, offset: usize) -> T {
        T::from_raw(self.peek(offset))
    }

    fn write<T: RegisterWidth>(&self, offset: usize, value: T) {
        self.regs.borrow_mut().insert(offset, value.to_raw());
        self.writes.borrow_mut().push((offset, value.to_raw()));
    }
}

//! An in-process `Target` backed by a flat buffer, used by scan and filter
//! tests that would otherwise need a real attached process.

use std::cell::RefCell;

use super::{Region, Target};
use crate::error::CoreError;

pub struct FakeTarget {
    regions: Vec<Region>,
    memory: RefCell<Vec<u8>>,
    suspended: RefCell<bool>,
}

impl FakeTarget {
    /// `base` is the address the buffer is mapped at; the whole buffer is
    /// exposed as one readable+writable region.
    pub fn new(base: u64, buffer: Vec<u8>) -> Self {
        let region = Region {
            start: base,
            size: buffer.len() as u64,
            readable: true,
            writable: true,
            executable: false,
            path: Some("[fake]".into()),
        };
        FakeTarget {
            regions: vec![region],
            memory: RefCell::new(buffer),
            suspended: RefCell::new(false),
        }
    }

    pub fn is_suspended(&self) -> bool {
        *self.suspended.borrow()
    }

    fn offset_of(&self, address: u64, len: usize) -> Result<usize, CoreError> {
        let region = self
            .regions
            .first()
            .ok_or_else(|| CoreError::Target("fake target has no regions".into()))?;
        if address < region.start || address + len as u64 > region.end() {
            return Err(CoreError::Target(format!(
                "address {address:#x} (len {len}) out of bounds"
            )));
        }
        Ok((address - region.start) as usize)
    }
}

impl Target for FakeTarget {
    fn regions(&self) -> Result<Vec<Region>, CoreError> {
        Ok(self.regions.clone())
    }

    fn read(&self, address: u64, len: usize) -> Result<Vec<u8>, CoreError> {
        let offset = self.offset_of(address, len)?;
        Ok(self.memory.borrow()[offset..offset + len].to_vec())
    }

    fn write(&self, address: u64, bytes: &[u8]) -> Result<(), CoreError> {
        let offset = self.offset_of(address, bytes.len())?;
        self.memory.borrow_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn suspend(&self) -> Result<(), CoreError> {
        *self.suspended.borrow_mut() = true;
        Ok(())
    }

    fn resume(&self) -> Result<(), CoreError> {
        *self.suspended.borrow_mut() = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_back_what_was_written() {
        let target = FakeTarget::new(0x1000, vec![0u8; 16]);
        target.write(0x1004, &42i32.to_le_bytes()).unwrap();
        let bytes = target.read(0x1004, 4).unwrap();
        assert_eq!(i32::from_le_bytes(bytes.try_into().unwrap()), 42);
    }

    #[test]
    fn out_of_bounds_read_is_a_target_error() {
        let target = FakeTarget::new(0x1000, vec![0u8; 16]);
        assert!(target.read(0x2000, 4).is_err());
    }
}

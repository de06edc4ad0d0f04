//! The initial-scan sweep over a target's address space (spec.md §4.6).
//!
//! Regions are read in `ScanConfig::block_size` chunks rather than byte by
//! byte; a region that fails to read (a common outcome for mapped-but-
//! unbacked regions, per the source tool's `mem_region_dump`) is skipped
//! with a warning rather than aborting the whole scan.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ScanConfig;
use crate::error::CoreError;
use crate::hit::{Hit, HitSet};
use crate::target::{BreakLease, Target};
use crate::value::{AddrWidth, Value, ValueType};

/// A cooperative cancellation flag a long-running scan polls between
/// blocks (spec.md §5: single-threaded cooperative concurrency).
#[derive(Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Sweeps every readable region of `target`, keeping every address whose
/// value (interpreted as `ty`) satisfies `predicate(address, value)`.
///
/// `width` must be the same decision the predicate itself was compiled
/// against (spec.md §4.6); this function does not re-derive it, so a region
/// starting above `width`'s range is skipped rather than silently
/// reinterpreted. Acquires a break lease for the duration of the sweep
/// (spec.md §5).
pub fn scan(
    target: &dyn Target,
    ty: &ValueType,
    config: &ScanConfig,
    width: AddrWidth,
    cancel: &CancellationFlag,
    mut predicate: impl FnMut(u64, &Value) -> bool,
) -> Result<HitSet, CoreError> {
    let _lease = BreakLease::acquire(target, Rc::new(Cell::new(0)))?;
    let regions = target.regions()?;
    let step = effective_step(ty, config);
    let mut hits = Vec::new();

    for region in regions.iter().filter(|r| r.readable) {
        if cancel.is_cancelled() {
            return Err(CoreError::Resource("scan cancelled".into()));
        }
        if region.start > max_address(width) {
            continue;
        }
        scan_region(target, region.start, region.size, ty, step, config, cancel, &mut predicate, &mut hits)?;
    }

    Ok(HitSet::new(ty.clone(), hits))
}

#[allow(clippy::too_many_arguments)]
fn scan_region(
    target: &dyn Target,
    start: u64,
    size: u64,
    ty: &ValueType,
    step: u64,
    config: &ScanConfig,
    cancel: &CancellationFlag,
    predicate: &mut impl FnMut(u64, &Value) -> bool,
    hits: &mut Vec<Hit>,
) -> Result<(), CoreError> {
    let value_width = ty.byte_width() as u64;
    let mut offset = 0u64;
    while offset < size {
        if cancel.is_cancelled() {
            return Err(CoreError::Resource("scan cancelled".into()));
        }
        let block_len = (config.block_size as u64).min(size - offset);
        // Read one extra value's worth so a candidate starting near the
        // end of this block isn't spuriously dropped.
        let read_len = (block_len + value_width).min(size - offset);
        let block = match target.read(start + offset, read_len as usize) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("skipping unreadable region at {:#x}: {e}", start + offset);
                return Ok(());
            }
        };

        let mut local = 0usize;
        while (local as u64) + value_width <= block.len() as u64 && (local as u64) < block_len {
            let address = start + offset + local as u64;
            if let Ok(value) = Value::from_le_bytes(ty, &block[local..]) {
                if predicate(address, &value) {
                    hits.push(Hit { address, ty: ty.clone() });
                }
            }
            local += step as usize;
        }
        offset += block_len;
    }
    Ok(())
}

fn effective_step(ty: &ValueType, config: &ScanConfig) -> u64 {
    if config.byte_granular {
        config.alignment.max(1)
    } else {
        config.alignment.max(ty.byte_width() as u64)
    }
}

fn max_address(width: AddrWidth) -> u64 {
    match width {
        AddrWidth::W32 => u32::MAX as u64,
        AddrWidth::W64 => u64::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::fake::FakeTarget;
    use crate::value::ScalarType;

    #[test]
    fn finds_every_matching_address() {
        let mut buf = vec![0u8; 32];
        buf[4..8].copy_from_slice(&1234i32.to_le_bytes());
        buf[20..24].copy_from_slice(&1234i32.to_le_bytes());
        let target = FakeTarget::new(0x1000, buf);

        let hits = scan(
            &target,
            &ValueType::Scalar(ScalarType::S32),
            &ScanConfig::default(),
            AddrWidth::W64,
            &CancellationFlag::new(),
            |_addr, v| matches!(v, Value::S32(1234)),
        )
        .unwrap();

        let addresses: Vec<u64> = hits.iter().map(|h| h.address).collect();
        assert_eq!(addresses, vec![0x1004, 0x1014]);
    }

    #[test]
    fn scan_binds_the_address_a_candidate_was_read_at() {
        let mut buf = vec![0u8; 16];
        buf[4..8].copy_from_slice(&7i32.to_le_bytes());
        let target = FakeTarget::new(0x1000, buf);

        let hits = scan(
            &target,
            &ValueType::Scalar(ScalarType::S32),
            &ScanConfig::default(),
            AddrWidth::W64,
            &CancellationFlag::new(),
            |addr, _v| addr == 0x1004,
        )
        .unwrap();

        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn scan_can_be_cancelled() {
        let target = FakeTarget::new(0x1000, vec![0u8; 1 << 20]);
        let cancel = CancellationFlag::new();
        cancel.cancel();
        let result = scan(
            &target,
            &ValueType::Scalar(ScalarType::S32),
            &ScanConfig::default(),
            AddrWidth::W64,
            &cancel,
            |_, _| true,
        );
        assert!(result.is_err());
    }

    #[test]
    fn scan_suspends_and_resumes_the_target() {
        let target = FakeTarget::new(0x1000, vec![0u8; 8]);
        scan(
            &target,
            &ValueType::Scalar(ScalarType::S32),
            &ScanConfig::default(),
            AddrWidth::W64,
            &CancellationFlag::new(),
            |_, _| false,
        )
        .unwrap();
        assert!(!target.is_suspended());
    }
}

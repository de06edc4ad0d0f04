//! Narrows an existing `HitSet` by re-reading each address and keeping
//! only the ones whose new value still satisfies a predicate (spec.md
//! §4.7).

use std::cell::Cell;
use std::rc::Rc;

use crate::error::CoreError;
use crate::hit::{Hit, HitSet};
use crate::target::{BreakLease, Target};

/// Re-reads every address in `hits` and keeps the ones where
/// `predicate(address, current_value)` is true. A hit's old value is never
/// consulted — it was never stored (spec.md §3) — so the predicate only
/// ever sees what is there now. If nothing is dropped, the input set is
/// handed back rather than a freshly allocated copy of the same addresses.
/// Acquires a break lease for the duration of the re-read (spec.md §5).
pub fn filter(
    target: &dyn Target,
    hits: &HitSet,
    mut predicate: impl FnMut(u64, &crate::value::Value) -> bool,
) -> Result<HitSet, CoreError> {
    let _lease = BreakLease::acquire(target, Rc::new(Cell::new(0)))?;
    let mut survivors = Vec::with_capacity(hits.len());

    for hit in hits.iter() {
        let current = match hit.read(target) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("dropping hit at {:#x}: {e}", hit.address);
                continue;
            }
        };
        if predicate(hit.address, &current) {
            survivors.push(hit.clone());
        }
    }

    if survivors.len() == hits.len() {
        return Ok(hits.clone());
    }
    Ok(HitSet::new(hits.ty().clone(), survivors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::fake::FakeTarget;
    use crate::value::{ScalarType, Value, ValueType};

    #[test]
    fn keeps_only_hits_matching_the_predicate() {
        let mut buf = vec![0u8; 16];
        buf[0..4].copy_from_slice(&10i32.to_le_bytes());
        buf[4..8].copy_from_slice(&20i32.to_le_bytes());
        let target = FakeTarget::new(0x1000, buf);
        let ty = ValueType::Scalar(ScalarType::S32);

        let hits = HitSet::new(
            ty.clone(),
            vec![
                Hit { address: 0x1000, ty: ty.clone() },
                Hit { address: 0x1004, ty: ty.clone() },
            ],
        );

        let filtered = filter(&target, &hits, |_addr, current| matches!(current, Value::S32(10))).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.iter().next().unwrap().address, 0x1000);
    }

    #[test]
    fn is_a_no_op_when_every_hit_still_matches() {
        let mut buf = vec![0u8; 4];
        buf.copy_from_slice(&10i32.to_le_bytes());
        let target = FakeTarget::new(0x1000, buf);
        let ty = ValueType::Scalar(ScalarType::S32);
        let hits = HitSet::new(ty.clone(), vec![Hit { address: 0x1000, ty }]);

        let filtered = filter(&target, &hits, |_, _| true).unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn predicate_sees_the_address_the_hit_was_found_at() {
        let target = FakeTarget::new(0x1000, 10i32.to_le_bytes().to_vec());
        let ty = ValueType::Scalar(ScalarType::S32);
        let hits = HitSet::new(ty.clone(), vec![Hit { address: 0x1000, ty }]);

        let filtered = filter(&target, &hits, |addr, _| addr == 0x1000).unwrap();
        assert_eq!(filtered.len(), 1);
    }
}

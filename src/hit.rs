//! A scan or filter result: an address paired with its type (spec.md §3).
//! The value itself is never stored here — it is re-read from the target
//! on demand, so a `Hit` can't go stale between when it was found and when
//! it's displayed or filtered.

use crate::ast::Node;
use crate::error::CoreError;
use crate::target::Target;
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub address: u64,
    pub ty: ValueType,
}

impl Hit {
    /// Re-reads this hit's current value from `target`.
    pub fn read(&self, target: &dyn Target) -> Result<Value, CoreError> {
        let bytes = target.read(self.address, self.ty.byte_width() as usize)?;
        Value::from_le_bytes(&self.ty, &bytes)
    }
}

/// An ordered set of hits sharing one declared type, plus the scan context
/// that produced them: the compiled predicate, kept around so a later
/// re-display or refinement doesn't need the original expression text
/// (spec.md §3: "hits, plus the scan context that created it").
#[derive(Debug, Clone)]
pub struct HitSet {
    hits: Vec<Hit>,
    ty: ValueType,
    predicate: Option<Node>,
}

impl HitSet {
    pub fn new(ty: ValueType, hits: Vec<Hit>) -> Self {
        HitSet { hits, ty, predicate: None }
    }

    /// Attaches the compiled predicate that produced this set.
    pub fn with_predicate(mut self, predicate: Node) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hit> {
        self.hits.iter()
    }

    pub fn ty(&self) -> &ValueType {
        &self.ty
    }

    pub fn predicate(&self) -> Option<&Node> {
        self.predicate.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::fake::FakeTarget;
    use crate::value::ScalarType;

    #[test]
    fn hit_rereads_its_current_value_rather_than_caching_it() {
        let target = FakeTarget::new(0x1000, 42i32.to_le_bytes().to_vec());
        let hit = Hit { address: 0x1000, ty: ValueType::Scalar(ScalarType::S32) };
        assert_eq!(hit.read(&target).unwrap(), Value::S32(42));

        target.write(0x1000, &99i32.to_le_bytes()).unwrap();
        assert_eq!(hit.read(&target).unwrap(), Value::S32(99));
    }
}

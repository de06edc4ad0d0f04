//! Fixed-width scalar values and the arithmetic dispatched across them.
//!
//! A [`Value`] pairs a tag with raw bits; the tag is always one of the ten
//! scalar types or a pointer. Casts, the unary/binary operators and the
//! promotion rule (`higher_type`) are implemented once, generically, via
//! `num_traits::AsPrimitive` rather than as a hand-written 10x10 dispatch
//! matrix.

use std::fmt;

use num_traits::AsPrimitive;

use crate::error::CoreError;

/// One of the ten non-pointer scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    S8,
    U8,
    S16,
    U16,
    S32,
    U32,
    S64,
    U64,
    F32,
    F64,
}

/// Abstract family a scalar type belongs to, used by the promotion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Signed,
    Unsigned,
    Float,
}

impl ScalarType {
    pub const ALL: [ScalarType; 10] = [
        ScalarType::S8,
        ScalarType::U8,
        ScalarType::S16,
        ScalarType::U16,
        ScalarType::S32,
        ScalarType::U32,
        ScalarType::S64,
        ScalarType::U64,
        ScalarType::F32,
        ScalarType::F64,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::S8 => "s8",
            ScalarType::U8 => "u8",
            ScalarType::S16 => "s16",
            ScalarType::U16 => "u16",
            ScalarType::S32 => "s32",
            ScalarType::U32 => "u32",
            ScalarType::S64 => "s64",
            ScalarType::U64 => "u64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ScalarType::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn byte_width(&self) -> u8 {
        match self {
            ScalarType::S8 | ScalarType::U8 => 1,
            ScalarType::S16 | ScalarType::U16 => 2,
            ScalarType::S32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::S64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    fn family(&self) -> Family {
        match self {
            ScalarType::S8 | ScalarType::S16 | ScalarType::S32 | ScalarType::S64 => {
                Family::Signed
            }
            ScalarType::U8 | ScalarType::U16 | ScalarType::U32 | ScalarType::U64 => {
                Family::Unsigned
            }
            ScalarType::F32 | ScalarType::F64 => Family::Float,
        }
    }

    pub fn is_float(&self) -> bool {
        self.family() == Family::Float
    }

    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Width of an address-sized quantity, chosen per session (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddrWidth {
    W32,
    W64,
}

impl AddrWidth {
    pub fn byte_width(&self) -> u8 {
        match self {
            AddrWidth::W32 => 4,
            AddrWidth::W64 => 8,
        }
    }

    /// The unsigned scalar type an address of this width is represented as.
    pub fn as_unsigned(&self) -> ScalarType {
        match self {
            AddrWidth::W32 => ScalarType::U32,
            AddrWidth::W64 => ScalarType::U64,
        }
    }
}

/// The full type of an expression node: a scalar, or a pointer to one.
///
/// Modeled as a distinct variant rather than a bit flag on the integer type
/// (see SPEC_FULL.md's "Pointer types" design note) so dereferencing is a
/// total function on `Pointer` alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Scalar(ScalarType),
    Pointer {
        pointee: Box<ValueType>,
        width: AddrWidth,
    },
}

impl ValueType {
    pub fn byte_width(&self) -> u8 {
        match self {
            ValueType::Scalar(s) => s.byte_width(),
            ValueType::Pointer { width, .. } => width.byte_width(),
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, ValueType::Pointer { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ValueType::Scalar(s) if s.is_float())
    }

    pub fn is_numeric(&self) -> bool {
        true // every ValueType (scalar or pointer) is numeric for cast/promotion purposes
    }

    pub fn is_integer(&self) -> bool {
        match self {
            ValueType::Scalar(s) => s.is_integer(),
            ValueType::Pointer { .. } => true,
        }
    }

    fn family(&self) -> Family {
        match self {
            ValueType::Scalar(s) => s.family(),
            ValueType::Pointer { .. } => Family::Unsigned,
        }
    }

    /// The dominant type under the promotion lattice: wider width wins;
    /// at equal width, float dominates int; at equal width among ints,
    /// unsigned dominates signed (spec.md §4.4).
    pub fn higher(a: &ValueType, b: &ValueType) -> ValueType {
        if a.byte_width() != b.byte_width() {
            return if a.byte_width() > b.byte_width() {
                a.clone()
            } else {
                b.clone()
            };
        }
        match (a.family(), b.family()) {
            (Family::Float, _) => a.clone(),
            (_, Family::Float) => b.clone(),
            (Family::Unsigned, _) => a.clone(),
            (_, Family::Unsigned) => b.clone(),
            _ => a.clone(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Scalar(s) => write!(f, "{s}"),
            ValueType::Pointer { pointee, .. } => write!(f, "{pointee}ptr"),
        }
    }
}

/// A typed runtime value: `(type, raw bits)`. The stored bit width always
/// matches the tag (spec.md §3 Value type invariant).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    S8(i8),
    U8(u8),
    S16(i16),
    U16(u16),
    S32(i32),
    U32(u32),
    S64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Pointer { address: u64, width: AddrWidth },
}

macro_rules! cast_to_scalar {
    ($v:expr, $to:expr) => {
        match $to {
            ScalarType::S8 => Value::S8($v.as_()),
            ScalarType::U8 => Value::U8($v.as_()),
            ScalarType::S16 => Value::S16($v.as_()),
            ScalarType::U16 => Value::U16($v.as_()),
            ScalarType::S32 => Value::S32($v.as_()),
            ScalarType::U32 => Value::U32($v.as_()),
            ScalarType::S64 => Value::S64($v.as_()),
            ScalarType::U64 => Value::U64($v.as_()),
            ScalarType::F32 => Value::F32($v.as_()),
            ScalarType::F64 => Value::F64($v.as_()),
        }
    };
}

macro_rules! same_type_dispatch {
    ($a:expr, $b:expr, $int_method:ident, $float_op:tt) => {{
        use Value::*;
        match ($a, $b) {
            (S8(x), S8(y)) => S8(x.$int_method(*y)),
            (U8(x), U8(y)) => U8(x.$int_method(*y)),
            (S16(x), S16(y)) => S16(x.$int_method(*y)),
            (U16(x), U16(y)) => U16(x.$int_method(*y)),
            (S32(x), S32(y)) => S32(x.$int_method(*y)),
            (U32(x), U32(y)) => U32(x.$int_method(*y)),
            (S64(x), S64(y)) => S64(x.$int_method(*y)),
            (U64(x), U64(y)) => U64(x.$int_method(*y)),
            (F32(x), F32(y)) => F32(x $float_op y),
            (F64(x), F64(y)) => F64(x $float_op y),
            _ => unreachable!("binary op reached on mismatched operand types"),
        }
    }};
}

macro_rules! int_only_dispatch {
    ($a:expr, $b:expr, $op:tt, $name:expr) => {{
        use Value::*;
        Ok(match ($a, $b) {
            (S8(x), S8(y)) => S8(x $op y),
            (U8(x), U8(y)) => U8(x $op y),
            (S16(x), S16(y)) => S16(x $op y),
            (U16(x), U16(y)) => U16(x $op y),
            (S32(x), S32(y)) => S32(x $op y),
            (U32(x), U32(y)) => U32(x $op y),
            (S64(x), S64(y)) => S64(x $op y),
            (U64(x), U64(y)) => U64(x $op y),
            _ => {
                return Err(CoreError::Eval(format!(
                    "{} requires integer operands",
                    $name
                )))
            }
        })
    }};
}

macro_rules! shift_int {
    (shl, $x:expr, $count:expr) => {
        $x.wrapping_shl($count)
    };
    (shr, $x:expr, $count:expr) => {
        $x.wrapping_shr($count)
    };
}

macro_rules! shift_dispatch {
    ($a:expr, $b:expr, $dir:ident) => {{
        use Value::*;
        let count_bits = |width: u32, count: u64| (count as u32) & (width - 1);
        Ok(match ($a, $b) {
            (S8(x), S8(y)) => S8(shift_int!($dir, x, count_bits(8, *y as u64))),
            (U8(x), U8(y)) => U8(shift_int!($dir, x, count_bits(8, *y as u64))),
            (S16(x), S16(y)) => S16(shift_int!($dir, x, count_bits(16, *y as u64))),
            (U16(x), U16(y)) => U16(shift_int!($dir, x, count_bits(16, *y as u64))),
            (S32(x), S32(y)) => S32(shift_int!($dir, x, count_bits(32, *y as u64))),
            (U32(x), U32(y)) => U32(shift_int!($dir, x, count_bits(32, *y as u64))),
            (S64(x), S64(y)) => S64(shift_int!($dir, x, count_bits(64, *y as u64))),
            (U64(x), U64(y)) => U64(shift_int!($dir, x, count_bits(64, *y as u64))),
            _ => {
                return Err(CoreError::Eval(
                    "shift operators require integer operands".into(),
                ))
            }
        })
    }};
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::S8(_) => ValueType::Scalar(ScalarType::S8),
            Value::U8(_) => ValueType::Scalar(ScalarType::U8),
            Value::S16(_) => ValueType::Scalar(ScalarType::S16),
            Value::U16(_) => ValueType::Scalar(ScalarType::U16),
            Value::S32(_) => ValueType::Scalar(ScalarType::S32),
            Value::U32(_) => ValueType::Scalar(ScalarType::U32),
            Value::S64(_) => ValueType::Scalar(ScalarType::S64),
            Value::U64(_) => ValueType::Scalar(ScalarType::U64),
            Value::F32(_) => ValueType::Scalar(ScalarType::F32),
            Value::F64(_) => ValueType::Scalar(ScalarType::F64),
            Value::Pointer { width, .. } => ValueType::Pointer {
                // the pointee type is not recoverable from the raw value
                // alone; callers that need it keep it alongside the value
                // (see ast::Node::Deref and eval::Environment).
                pointee: Box::new(ValueType::Scalar(width.as_unsigned())),
                width: *width,
            },
        }
    }

    /// Little-endian bytes backing this value, used to write through to a
    /// target process and for `is_zero`.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Value::S8(v) => v.to_le_bytes().to_vec(),
            Value::U8(v) => v.to_le_bytes().to_vec(),
            Value::S16(v) => v.to_le_bytes().to_vec(),
            Value::U16(v) => v.to_le_bytes().to_vec(),
            Value::S32(v) => v.to_le_bytes().to_vec(),
            Value::U32(v) => v.to_le_bytes().to_vec(),
            Value::S64(v) => v.to_le_bytes().to_vec(),
            Value::U64(v) => v.to_le_bytes().to_vec(),
            Value::F32(v) => v.to_le_bytes().to_vec(),
            Value::F64(v) => v.to_le_bytes().to_vec(),
            Value::Pointer { address, width } => match width {
                AddrWidth::W32 => (*address as u32).to_le_bytes().to_vec(),
                AddrWidth::W64 => address.to_le_bytes().to_vec(),
            },
        }
    }

    /// Parse little-endian bytes read from a target into a value of `ty`.
    pub fn from_le_bytes(ty: &ValueType, bytes: &[u8]) -> Result<Value, CoreError> {
        let width = ty.byte_width() as usize;
        if bytes.len() < width {
            return Err(CoreError::Eval("short read for value".into()));
        }
        Ok(match ty {
            ValueType::Scalar(ScalarType::S8) => Value::S8(bytes[0] as i8),
            ValueType::Scalar(ScalarType::U8) => Value::U8(bytes[0]),
            ValueType::Scalar(ScalarType::S16) => {
                Value::S16(i16::from_le_bytes(bytes[..2].try_into().unwrap()))
            }
            ValueType::Scalar(ScalarType::U16) => {
                Value::U16(u16::from_le_bytes(bytes[..2].try_into().unwrap()))
            }
            ValueType::Scalar(ScalarType::S32) => {
                Value::S32(i32::from_le_bytes(bytes[..4].try_into().unwrap()))
            }
            ValueType::Scalar(ScalarType::U32) => {
                Value::U32(u32::from_le_bytes(bytes[..4].try_into().unwrap()))
            }
            ValueType::Scalar(ScalarType::S64) => {
                Value::S64(i64::from_le_bytes(bytes[..8].try_into().unwrap()))
            }
            ValueType::Scalar(ScalarType::U64) => {
                Value::U64(u64::from_le_bytes(bytes[..8].try_into().unwrap()))
            }
            ValueType::Scalar(ScalarType::F32) => {
                Value::F32(f32::from_le_bytes(bytes[..4].try_into().unwrap()))
            }
            ValueType::Scalar(ScalarType::F64) => {
                Value::F64(f64::from_le_bytes(bytes[..8].try_into().unwrap()))
            }
            ValueType::Pointer { width, .. } => {
                let address = match width {
                    AddrWidth::W32 => {
                        u32::from_le_bytes(bytes[..4].try_into().unwrap()) as u64
                    }
                    AddrWidth::W64 => u64::from_le_bytes(bytes[..8].try_into().unwrap()),
                };
                Value::Pointer {
                    address,
                    width: *width,
                }
            }
        })
    }

    /// Bytewise zero test, matching `value_is_zero` in the source this
    /// crate is grounded on (a `-0.0` float is therefore not zero).
    pub fn is_zero(&self) -> bool {
        self.to_le_bytes().iter().all(|b| *b == 0)
    }

    pub fn cast(&self, to: &ValueType) -> Value {
        match to {
            ValueType::Pointer { width, .. } => Value::Pointer {
                address: self.as_address_bits(),
                width: *width,
            },
            ValueType::Scalar(s) => self.cast_scalar(*s),
        }
    }

    fn as_address_bits(&self) -> u64 {
        match self {
            Value::S8(v) => *v as i64 as u64,
            Value::U8(v) => *v as u64,
            Value::S16(v) => *v as i64 as u64,
            Value::U16(v) => *v as u64,
            Value::S32(v) => *v as i64 as u64,
            Value::U32(v) => *v as u64,
            Value::S64(v) => *v as u64,
            Value::U64(v) => *v,
            Value::F32(v) => *v as u64,
            Value::F64(v) => *v as u64,
            Value::Pointer { address, .. } => *address,
        }
    }

    fn cast_scalar(&self, to: ScalarType) -> Value {
        match self {
            Value::S8(v) => cast_to_scalar!(*v, to),
            Value::U8(v) => cast_to_scalar!(*v, to),
            Value::S16(v) => cast_to_scalar!(*v, to),
            Value::U16(v) => cast_to_scalar!(*v, to),
            Value::S32(v) => cast_to_scalar!(*v, to),
            Value::U32(v) => cast_to_scalar!(*v, to),
            Value::S64(v) => cast_to_scalar!(*v, to),
            Value::U64(v) => cast_to_scalar!(*v, to),
            Value::F32(v) => cast_to_scalar!(*v, to),
            Value::F64(v) => cast_to_scalar!(*v, to),
            Value::Pointer { address, .. } => cast_to_scalar!(*address, to),
        }
    }

    pub fn neg(&self) -> Result<Value, CoreError> {
        Ok(match self {
            Value::S8(v) => Value::S8(v.wrapping_neg()),
            Value::S16(v) => Value::S16(v.wrapping_neg()),
            Value::S32(v) => Value::S32(v.wrapping_neg()),
            Value::S64(v) => Value::S64(v.wrapping_neg()),
            Value::U8(v) => Value::U8(v.wrapping_neg()),
            Value::U16(v) => Value::U16(v.wrapping_neg()),
            Value::U32(v) => Value::U32(v.wrapping_neg()),
            Value::U64(v) => Value::U64(v.wrapping_neg()),
            Value::F32(v) => Value::F32(-v),
            Value::F64(v) => Value::F64(-v),
            Value::Pointer { .. } => {
                return Err(CoreError::Eval("cannot negate a pointer value".into()))
            }
        })
    }

    pub fn logical_not(&self) -> Value {
        Value::S32(if self.is_zero() { 1 } else { 0 })
    }

    pub fn compl(&self) -> Result<Value, CoreError> {
        Ok(match self {
            Value::S8(v) => Value::S8(!v),
            Value::S16(v) => Value::S16(!v),
            Value::S32(v) => Value::S32(!v),
            Value::S64(v) => Value::S64(!v),
            Value::U8(v) => Value::U8(!v),
            Value::U16(v) => Value::U16(!v),
            Value::U32(v) => Value::U32(!v),
            Value::U64(v) => Value::U64(!v),
            _ => return Err(CoreError::Eval("~ requires an integer operand".into())),
        })
    }

    pub fn add(&self, other: &Value) -> Value {
        same_type_dispatch!(self, other, wrapping_add, +)
    }

    pub fn sub(&self, other: &Value) -> Value {
        same_type_dispatch!(self, other, wrapping_sub, -)
    }

    pub fn mul(&self, other: &Value) -> Value {
        same_type_dispatch!(self, other, wrapping_mul, *)
    }

    pub fn div(&self, other: &Value) -> Result<Value, CoreError> {
        if other.is_zero() {
            return Err(CoreError::Eval("division by zero".into()));
        }
        Ok(same_type_dispatch!(self, other, wrapping_div, /))
    }

    pub fn rem(&self, other: &Value) -> Result<Value, CoreError> {
        if other.is_zero() {
            return Err(CoreError::Eval("modulo by zero".into()));
        }
        use Value::*;
        Ok(match (self, other) {
            (S8(a), S8(b)) => S8(a.wrapping_rem(*b)),
            (U8(a), U8(b)) => U8(a.wrapping_rem(*b)),
            (S16(a), S16(b)) => S16(a.wrapping_rem(*b)),
            (U16(a), U16(b)) => U16(a.wrapping_rem(*b)),
            (S32(a), S32(b)) => S32(a.wrapping_rem(*b)),
            (U32(a), U32(b)) => U32(a.wrapping_rem(*b)),
            (S64(a), S64(b)) => S64(a.wrapping_rem(*b)),
            (U64(a), U64(b)) => U64(a.wrapping_rem(*b)),
            _ => return Err(CoreError::Eval("% requires integer operands".into())),
        })
    }

    pub fn bitand(&self, other: &Value) -> Result<Value, CoreError> {
        int_only_dispatch!(self, other, &, "&")
    }

    pub fn bitor(&self, other: &Value) -> Result<Value, CoreError> {
        int_only_dispatch!(self, other, |, "|")
    }

    pub fn bitxor(&self, other: &Value) -> Result<Value, CoreError> {
        int_only_dispatch!(self, other, ^, "^")
    }

    /// Shift count masked by `width - 1` (spec.md §4.1 edge case).
    pub fn shl(&self, other: &Value) -> Result<Value, CoreError> {
        shift_dispatch!(self, other, shl)
    }

    pub fn shr(&self, other: &Value) -> Result<Value, CoreError> {
        shift_dispatch!(self, other, shr)
    }

    pub fn eq_op(&self, other: &Value) -> Value {
        Value::S32(if values_equal(self, other) { 1 } else { 0 })
    }

    pub fn neq_op(&self, other: &Value) -> Value {
        Value::S32(if values_equal(self, other) { 0 } else { 1 })
    }

    pub fn lt(&self, other: &Value) -> Value {
        Value::S32(if compare(self, other) == Some(std::cmp::Ordering::Less) {
            1
        } else {
            0
        })
    }

    pub fn gt(&self, other: &Value) -> Value {
        Value::S32(
            if compare(self, other) == Some(std::cmp::Ordering::Greater) {
                1
            } else {
                0
            },
        )
    }

    pub fn le(&self, other: &Value) -> Value {
        Value::S32(match compare(self, other) {
            Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal) => 1,
            _ => 0,
        })
    }

    pub fn ge(&self, other: &Value) -> Value {
        Value::S32(match compare(self, other) {
            Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal) => 1,
            _ => 0,
        })
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    use Value::*;
    match (a, b) {
        (S8(x), S8(y)) => x == y,
        (U8(x), U8(y)) => x == y,
        (S16(x), S16(y)) => x == y,
        (U16(x), U16(y)) => x == y,
        (S32(x), S32(y)) => x == y,
        (U32(x), U32(y)) => x == y,
        (S64(x), S64(y)) => x == y,
        (U64(x), U64(y)) => x == y,
        (F32(x), F32(y)) => x == y, // NaN handled by IEEE 754 float equality
        (F64(x), F64(y)) => x == y,
        (Pointer { address: x, .. }, Pointer { address: y, .. }) => x == y,
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    use Value::*;
    match (a, b) {
        (S8(x), S8(y)) => x.partial_cmp(y),
        (U8(x), U8(y)) => x.partial_cmp(y),
        (S16(x), S16(y)) => x.partial_cmp(y),
        (U16(x), U16(y)) => x.partial_cmp(y),
        (S32(x), S32(y)) => x.partial_cmp(y),
        (U32(x), U32(y)) => x.partial_cmp(y),
        (S64(x), S64(y)) => x.partial_cmp(y),
        (U64(x), U64(y)) => x.partial_cmp(y),
        (F32(x), F32(y)) => x.partial_cmp(y), // None for NaN: spec's unordered semantics
        (F64(x), F64(y)) => x.partial_cmp(y),
        (Pointer { address: x, .. }, Pointer { address: y, .. }) => x.partial_cmp(y),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::S8(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::S16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::S32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::S64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Pointer { address, .. } => write!(f, "0x{address:x}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn cast_saturates_out_of_range_float_to_int() {
        let v = Value::F64(1e30);
        assert_eq!(v.cast(&ValueType::Scalar(ScalarType::S32)), Value::S32(i32::MAX));
        let v = Value::F64(-1e30);
        assert_eq!(v.cast(&ValueType::Scalar(ScalarType::S32)), Value::S32(i32::MIN));
    }

    #[test]
    fn cast_truncates_toward_zero() {
        let v = Value::F64(1.7);
        assert_eq!(v.cast(&ValueType::Scalar(ScalarType::S32)), Value::S32(1));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(Value::S32(1).div(&Value::S32(0)).is_err());
        assert!(Value::F64(1.0).div(&Value::F64(0.0)).is_err());
    }

    #[test]
    fn shift_count_is_masked_by_width_minus_one() {
        // 1u32 << 32 would be UB in C; masked to << 0 here.
        let v = Value::U32(1).shl(&Value::U32(32)).unwrap();
        assert_eq!(v, Value::U32(1));
    }

    #[test]
    fn nan_relational_semantics_follow_ieee754() {
        let nan = Value::F64(f64::NAN);
        let one = Value::F64(1.0);
        assert_eq!(nan.eq_op(&one), Value::S32(0));
        assert_eq!(nan.neq_op(&one), Value::S32(1));
        assert_eq!(nan.lt(&one), Value::S32(0));
        assert_eq!(nan.gt(&one), Value::S32(0));
    }

    #[rstest]
    #[case(ScalarType::S8, ScalarType::S32, ScalarType::S32)]
    #[case(ScalarType::U32, ScalarType::S32, ScalarType::U32)]
    #[case(ScalarType::S32, ScalarType::F32, ScalarType::F32)]
    #[case(ScalarType::F32, ScalarType::S64, ScalarType::S64)]
    #[case(ScalarType::S64, ScalarType::F64, ScalarType::F64)]
    fn higher_type_follows_the_promotion_lattice(
        #[case] a: ScalarType,
        #[case] b: ScalarType,
        #[case] expect: ScalarType,
    ) {
        let higher = ValueType::higher(&ValueType::Scalar(a), &ValueType::Scalar(b));
        assert_eq!(higher, ValueType::Scalar(expect));
    }

    #[test]
    fn is_zero_is_bytewise_not_numeric() {
        assert!(Value::F64(0.0).is_zero());
        assert!(!Value::F64(-0.0).is_zero());
    }
}

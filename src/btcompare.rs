//! Three-way comparison and skip support for ordered index key types.
//!
//! Comparators here compute `cmp(a, b)`: negative if `a < b`, zero if
//! `a == b`, positive if `a > b`. Callers must accept *any* negative or
//! positive value, not just `-1`/`+1`: some platforms' `memcmp` already
//! returns other magnitudes, and the `stress-cmp-extremes` feature compiles
//! the comparators to return `i32::MIN`/`i32::MAX` to flush out callers
//! that assume otherwise.
//!
//! Every comparator imposes a total order over its whole value domain and
//! agrees with the type's `==`/`<`/`>` operators. Comparisons between
//! integer types of different widths widen to the larger signed type
//! first; subtraction shortcuts are only used where the widened
//! subtraction cannot overflow.
//!
//! [`SkipSupport`] supplies the `increment`/`decrement`/`low_elem`/
//! `high_elem` quartet that range-skip index scans use to step through a
//! key domain.

use std::cmp::Ordering;

use thiserror::Error;

#[cfg(not(feature = "stress-cmp-extremes"))]
const A_LESS_THAN_B: i32 = -1;
#[cfg(not(feature = "stress-cmp-extremes"))]
const A_GREATER_THAN_B: i32 = 1;

#[cfg(feature = "stress-cmp-extremes")]
const A_LESS_THAN_B: i32 = i32::MIN;
#[cfg(feature = "stress-cmp-extremes")]
const A_GREATER_THAN_B: i32 = i32::MAX;

#[inline]
fn three_way<T: Ord>(a: T, b: T) -> i32 {
    match a.cmp(&b) {
        Ordering::Greater => A_GREATER_THAN_B,
        Ordering::Equal => 0,
        Ordering::Less => A_LESS_THAN_B,
    }
}

/// Compare booleans; `false` sorts before `true`.
#[inline]
pub fn bool_cmp(a: bool, b: bool) -> i32 {
    a as i32 - b as i32
}

/// Compare 16-bit integers.
#[inline]
pub fn int2_cmp(a: i16, b: i16) -> i32 {
    // The i32 subtraction cannot overflow for i16 operands.
    a as i32 - b as i32
}

/// Compare 32-bit integers.
#[inline]
pub fn int4_cmp(a: i32, b: i32) -> i32 {
    three_way(a, b)
}

/// Compare 64-bit integers.
#[inline]
pub fn int8_cmp(a: i64, b: i64) -> i32 {
    three_way(a, b)
}

/// Compare i16 against i32.
#[inline]
pub fn int24_cmp(a: i16, b: i32) -> i32 {
    three_way(a as i32, b)
}

/// Compare i32 against i16.
#[inline]
pub fn int42_cmp(a: i32, b: i16) -> i32 {
    three_way(a, b as i32)
}

/// Compare i16 against i64.
#[inline]
pub fn int28_cmp(a: i16, b: i64) -> i32 {
    three_way(a as i64, b)
}

/// Compare i64 against i16.
#[inline]
pub fn int82_cmp(a: i64, b: i16) -> i32 {
    three_way(a, b as i64)
}

/// Compare i32 against i64.
#[inline]
pub fn int48_cmp(a: i32, b: i64) -> i32 {
    three_way(a as i64, b)
}

/// Compare i64 against i32.
#[inline]
pub fn int84_cmp(a: i64, b: i32) -> i32 {
    three_way(a, b as i64)
}

/// Compare single-byte "char" keys as unsigned.
#[inline]
pub fn char_cmp(a: u8, b: u8) -> i32 {
    a as i32 - b as i32
}

/// Compare object identifiers (unsigned 32-bit).
#[inline]
pub fn oid_cmp(a: u32, b: u32) -> i32 {
    three_way(a, b)
}

/// Compare oid vectors: first by length, then elementwise.
pub fn oidvector_cmp(a: &[u32], b: &[u32]) -> i32 {
    if a.len() != b.len() {
        return three_way(a.len(), b.len());
    }
    for (x, y) in a.iter().zip(b.iter()) {
        if x != y {
            return three_way(x, y);
        }
    }
    0
}

/// Successor/predecessor stepping over a totally ordered key domain.
///
/// `increment` and `decrement` return `None` at the domain's maximum and
/// minimum respectively; everywhere else they return the immediate
/// neighbor in the order the matching `*_cmp` function imposes.
///
/// # Examples
///
/// ```
/// use pgsasl_proto::btcompare::SkipSupport;
///
/// assert_eq!(false.increment(), Some(true));
/// assert_eq!(true.increment(), None);
/// assert_eq!(i32::LOW_ELEM, i32::MIN);
/// assert_eq!(255u8.increment(), None);
/// ```
pub trait SkipSupport: Copy + Sized {
    /// The smallest value of the domain.
    const LOW_ELEM: Self;
    /// The largest value of the domain.
    const HIGH_ELEM: Self;

    /// The immediate successor, or `None` on overflow at the maximum.
    fn increment(self) -> Option<Self>;

    /// The immediate predecessor, or `None` on underflow at the minimum.
    fn decrement(self) -> Option<Self>;
}

impl SkipSupport for bool {
    const LOW_ELEM: Self = false;
    const HIGH_ELEM: Self = true;

    fn increment(self) -> Option<Self> {
        if self {
            None
        } else {
            Some(true)
        }
    }

    fn decrement(self) -> Option<Self> {
        if self {
            Some(false)
        } else {
            None
        }
    }
}

macro_rules! integer_skip_support {
    ($($ty:ty),*) => {
        $(
            impl SkipSupport for $ty {
                const LOW_ELEM: Self = <$ty>::MIN;
                const HIGH_ELEM: Self = <$ty>::MAX;

                fn increment(self) -> Option<Self> {
                    self.checked_add(1)
                }

                fn decrement(self) -> Option<Self> {
                    self.checked_sub(1)
                }
            }
        )*
    };
}

// char keys step as unsigned bytes (0..=255); oids as unsigned 32-bit
// (0..=u32::MAX).
integer_skip_support!(i16, i32, i64, u8, u32);

/// Attempted comparison between key kinds with no defined order.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot compare {left} key with {right} key")]
pub struct KeyCompareError {
    /// Kind name of the left operand.
    pub left: &'static str,
    /// Kind name of the right operand.
    pub right: &'static str,
}

/// An index key value of one of the supported ordered kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IndexKey {
    /// Boolean key.
    Bool(bool),
    /// 16-bit signed integer key.
    Int2(i16),
    /// 32-bit signed integer key.
    Int4(i32),
    /// 64-bit signed integer key.
    Int8(i64),
    /// Single-byte "char" key, ordered unsigned.
    Char(u8),
    /// Object identifier key (unsigned 32-bit).
    Oid(u32),
    /// Vector of object identifiers, ordered by length then elements.
    OidVector(Vec<u32>),
}

impl IndexKey {
    /// Name of this key's kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            IndexKey::Bool(_) => "bool",
            IndexKey::Int2(_) => "int2",
            IndexKey::Int4(_) => "int4",
            IndexKey::Int8(_) => "int8",
            IndexKey::Char(_) => "char",
            IndexKey::Oid(_) => "oid",
            IndexKey::OidVector(_) => "oidvector",
        }
    }

    /// Three-way comparison against another key.
    ///
    /// Integer kinds of different widths compare by widening; any other
    /// cross-kind pairing is an error.
    pub fn compare(&self, other: &IndexKey) -> Result<i32, KeyCompareError> {
        use IndexKey::*;
        Ok(match (self, other) {
            (Bool(a), Bool(b)) => bool_cmp(*a, *b),
            (Int2(a), Int2(b)) => int2_cmp(*a, *b),
            (Int2(a), Int4(b)) => int24_cmp(*a, *b),
            (Int2(a), Int8(b)) => int28_cmp(*a, *b),
            (Int4(a), Int2(b)) => int42_cmp(*a, *b),
            (Int4(a), Int4(b)) => int4_cmp(*a, *b),
            (Int4(a), Int8(b)) => int48_cmp(*a, *b),
            (Int8(a), Int2(b)) => int82_cmp(*a, *b),
            (Int8(a), Int4(b)) => int84_cmp(*a, *b),
            (Int8(a), Int8(b)) => int8_cmp(*a, *b),
            (Char(a), Char(b)) => char_cmp(*a, *b),
            (Oid(a), Oid(b)) => oid_cmp(*a, *b),
            (OidVector(a), OidVector(b)) => oidvector_cmp(a, b),
            _ => {
                return Err(KeyCompareError {
                    left: self.kind_name(),
                    right: other.kind_name(),
                })
            }
        })
    }

    /// The immediate successor in this key's domain, or `None` on
    /// overflow. `OidVector` has no skip support.
    pub fn increment(&self) -> Option<IndexKey> {
        use IndexKey::*;
        match self {
            Bool(v) => v.increment().map(Bool),
            Int2(v) => v.increment().map(Int2),
            Int4(v) => v.increment().map(Int4),
            Int8(v) => v.increment().map(Int8),
            Char(v) => v.increment().map(Char),
            Oid(v) => v.increment().map(Oid),
            OidVector(_) => None,
        }
    }

    /// The immediate predecessor in this key's domain, or `None` on
    /// underflow. `OidVector` has no skip support.
    pub fn decrement(&self) -> Option<IndexKey> {
        use IndexKey::*;
        match self {
            Bool(v) => v.decrement().map(Bool),
            Int2(v) => v.decrement().map(Int2),
            Int4(v) => v.decrement().map(Int4),
            Int8(v) => v.decrement().map(Int8),
            Char(v) => v.decrement().map(Char),
            Oid(v) => v.decrement().map(Oid),
            OidVector(_) => None,
        }
    }

    /// The domain minimum of this key's kind, if it has one.
    pub fn low_elem(&self) -> Option<IndexKey> {
        use IndexKey::*;
        match self {
            Bool(_) => Some(Bool(bool::LOW_ELEM)),
            Int2(_) => Some(Int2(i16::LOW_ELEM)),
            Int4(_) => Some(Int4(i32::LOW_ELEM)),
            Int8(_) => Some(Int8(i64::LOW_ELEM)),
            Char(_) => Some(Char(u8::LOW_ELEM)),
            Oid(_) => Some(Oid(u32::LOW_ELEM)),
            OidVector(_) => None,
        }
    }

    /// The domain maximum of this key's kind, if it has one.
    pub fn high_elem(&self) -> Option<IndexKey> {
        use IndexKey::*;
        match self {
            Bool(_) => Some(Bool(bool::HIGH_ELEM)),
            Int2(_) => Some(Int2(i16::HIGH_ELEM)),
            Int4(_) => Some(Int4(i32::HIGH_ELEM)),
            Int8(_) => Some(Int8(i64::HIGH_ELEM)),
            Char(_) => Some(Char(u8::HIGH_ELEM)),
            Oid(_) => Some(Oid(u32::HIGH_ELEM)),
            OidVector(_) => None,
        }
    }
}

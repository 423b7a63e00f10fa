//! Typed storage identifiers.
//!
//! An [`RnId<T>`] is the position of a storage record of type `T` inside its
//! primitive storage. The type parameter keeps an id for a lane record from
//! being used where a node record id is expected. The raw value `-1` is the
//! null sentinel and stands for an absent reference.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a storage record of type `T`.
///
/// Serializes as a bare integer.
pub struct RnId<T> {
    raw: i32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RnId<T> {
    /// Raw value of the null sentinel.
    pub const INVALID_RAW: i32 = -1;

    /// Wraps a raw identifier. Only [`INVALID_RAW`](Self::INVALID_RAW) means
    /// null; other negative values are malformed and never resolve.
    pub const fn new(raw: i32) -> Self {
        RnId {
            raw,
            _marker: PhantomData,
        }
    }

    /// The null identifier.
    pub const fn invalid() -> Self {
        Self::new(Self::INVALID_RAW)
    }

    /// Identifier for a storage position, or `None` if the position does not
    /// fit the identifier range.
    pub fn from_index(index: usize) -> Option<Self> {
        i32::try_from(index).ok().map(Self::new)
    }

    pub const fn raw(self) -> i32 {
        self.raw
    }

    /// True for an identifier that can name a record position.
    pub const fn is_valid(self) -> bool {
        self.raw >= 0
    }

    /// True only for the null sentinel.
    pub const fn is_null(self) -> bool {
        self.raw == Self::INVALID_RAW
    }

    /// Storage position this id refers to, `None` for the null sentinel.
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.raw).ok()
    }
}

impl<T> Default for RnId<T> {
    fn default() -> Self {
        Self::invalid()
    }
}

// Manual impls: derives would require `T` itself to implement each trait.

impl<T> Clone for RnId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RnId<T> {}

impl<T> PartialEq for RnId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for RnId<T> {}

impl<T> PartialOrd for RnId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for RnId<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for RnId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for RnId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("RnId(invalid)")
        } else {
            write!(f, "RnId({})", self.raw)
        }
    }
}

impl<T> fmt::Display for RnId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<T> Serialize for RnId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.raw)
    }
}

impl<'de, T> Deserialize<'de> for RnId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn default_is_invalid() {
        let id = RnId::<Marker>::default();
        assert!(!id.is_valid());
        assert_eq!(id.raw(), -1);
        assert_eq!(id.index(), None);
    }

    #[test]
    fn from_index_is_valid() {
        let id = RnId::<Marker>::from_index(7).unwrap();
        assert!(id.is_valid());
        assert_eq!(id.index(), Some(7));
        assert_eq!(format!("{}", id), "7");
        assert_eq!(format!("{:?}", id), "RnId(7)");
    }

    #[test]
    fn from_index_rejects_overflow() {
        assert!(RnId::<Marker>::from_index(i32::MAX as usize + 1).is_none());
    }

    #[test]
    fn serde_as_plain_integer() {
        let id = RnId::<Marker>::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: RnId<Marker> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let null: RnId<Marker> = serde_json::from_str("-1").unwrap();
        assert!(!null.is_valid());
        assert!(null.is_null());
    }

    #[test]
    fn other_negatives_are_not_null() {
        let id = RnId::<Marker>::new(-7);
        assert!(!id.is_valid());
        assert!(!id.is_null());
        assert_eq!(id.index(), None);
        assert_eq!(format!("{:?}", id), "RnId(-7)");
    }
}

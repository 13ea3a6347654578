//! Absent/present wrapper for partial updates
//!
//! A field the caller did not send is [`Patch::Absent`] and must leave the
//! stored value untouched. A field that was sent is [`Patch::Present`], even
//! when its value is `null` (use `Patch<Option<T>>` for nullable columns).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Present(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Patch::Present(_))
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Present(v) => Patch::Present(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Present(v) => Patch::Present(f(v)),
        }
    }

    /// `Some(value)` when present
    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Absent => None,
            Patch::Present(v) => Some(v),
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Present(value)
    }
}

// Only reached when the key exists; pair with `#[serde(default)]` on the field.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Patch::Present)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Absent => serializer.serialize_none(),
            Patch::Present(v) => v.serialize(serializer),
        }
    }
}

//! Mapping flag bits.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bit set describing what kind of mapping a [`ClassMapping`](super::ClassMapping) is.
///
/// Class mappings carry `OBJECT | CLASS` plus exactly one of `ENTITY` or
/// `EMBEDDABLE`. Anonymous object mappings carry `OBJECT` only.
/// `INHERITANCE_ROOT` is set on the top of a mapped hierarchy.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MappingFlags(u8);

impl MappingFlags {
    /// Structured object with named fields.
    pub const OBJECT: Self = Self(1);
    /// Backed by a named, registered type.
    pub const CLASS: Self = Self(1 << 1);
    /// Root-persisted with its own identifier.
    pub const ENTITY: Self = Self(1 << 2);
    /// Nested inside an entity document.
    pub const EMBEDDABLE: Self = Self(1 << 3);
    /// Top of a mapped inheritance hierarchy.
    pub const INHERITANCE_ROOT: Self = Self(1 << 4);

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for MappingFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for MappingFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for MappingFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(MappingFlags, &str); 5] = [
            (MappingFlags::OBJECT, "OBJECT"),
            (MappingFlags::CLASS, "CLASS"),
            (MappingFlags::ENTITY, "ENTITY"),
            (MappingFlags::EMBEDDABLE, "EMBEDDABLE"),
            (MappingFlags::INHERITANCE_ROOT, "INHERITANCE_ROOT"),
        ];

        let set: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "MappingFlags({})", set.join(" | "))
    }
}

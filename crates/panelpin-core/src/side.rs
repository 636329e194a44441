#![forbid(unsafe_code)]

//! Sidebar sides and side sets.
//!
//! Panels live on exactly one [`Side`]. Zones may drive one or both
//! sidebars, so they carry a [`SideSet`].
//!
//! # Invariants
//!
//! 1. `SideSet::EMPTY` contains no side; a zone with an empty set never
//!    contributes to sidebar activation.
//! 2. `SideSet::BOTH` contains every side.
//! 3. Inserting a side twice is idempotent.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which sidebar a panel or zone belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides in display order.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];

    /// Lowercase label used in logs and host bindings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    const fn bit(self) -> u8 {
        1u8 << (self as u8)
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown side label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown side {0:?} (expected \"left\" or \"right\")")]
pub struct ParseSideError(pub String);

impl std::str::FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("left") => Ok(Self::Left),
            s if s.eq_ignore_ascii_case("right") => Ok(Self::Right),
            other => Err(ParseSideError(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// SideSet
// ---------------------------------------------------------------------------

/// A set of sides. Bit `i` is set when the side with ordinal `i` is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SideSet {
    mask: u8,
}

impl SideSet {
    pub const EMPTY: Self = Self { mask: 0 };
    pub const LEFT: Self = Self::only(Side::Left);
    pub const RIGHT: Self = Self::only(Side::Right);
    pub const BOTH: Self = Self { mask: 0b11 };

    /// A set holding exactly one side.
    #[must_use]
    pub const fn only(side: Side) -> Self {
        Self { mask: side.bit() }
    }

    #[must_use]
    pub const fn contains(self, side: Side) -> bool {
        self.mask & side.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.mask == 0
    }

    #[must_use]
    pub const fn with(self, side: Side) -> Self {
        Self {
            mask: self.mask | side.bit(),
        }
    }

    pub fn insert(&mut self, side: Side) {
        self.mask |= side.bit();
    }

    pub fn remove(&mut self, side: Side) {
        self.mask &= !side.bit();
    }

    /// Sides present in the set, left first.
    pub fn iter(self) -> impl Iterator<Item = Side> {
        Side::ALL.into_iter().filter(move |&side| self.contains(side))
    }
}

impl From<Side> for SideSet {
    fn from(side: Side) -> Self {
        Self::only(side)
    }
}

impl<const N: usize> From<[Side; N]> for SideSet {
    fn from(sides: [Side; N]) -> Self {
        sides.into_iter().collect()
    }
}

impl From<&[Side]> for SideSet {
    fn from(sides: &[Side]) -> Self {
        sides.iter().copied().collect()
    }
}

impl FromIterator<Side> for SideSet {
    fn from_iter<I: IntoIterator<Item = Side>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl std::fmt::Display for SideSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for side in self.iter() {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(side.label())?;
            first = false;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

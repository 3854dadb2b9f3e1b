// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

/// Identifier of a place that can be marked as a favorite.
///
/// Place ids are database primary keys, so zero is never a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PlaceId(NonZeroU64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid place id: {0:?}")]
pub struct InvalidPlaceId(pub String);

impl PlaceId {
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for PlaceId {
    type Error = InvalidPlaceId;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| InvalidPlaceId(value.to_string()))
    }
}

impl From<PlaceId> for u64 {
    fn from(id: PlaceId) -> Self {
        id.get()
    }
}

impl FromStr for PlaceId {
    type Err = InvalidPlaceId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| InvalidPlaceId(s.to_string()))
    }
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lenient conversion used by every registry operation.
///
/// Returns `None` for zero, negative, or unparsable input; callers treat
/// that as a no-op rather than an error.
pub trait IntoPlaceId {
    fn into_place_id(self) -> Option<PlaceId>;
}

impl IntoPlaceId for PlaceId {
    fn into_place_id(self) -> Option<PlaceId> {
        Some(self)
    }
}

impl IntoPlaceId for u64 {
    fn into_place_id(self) -> Option<PlaceId> {
        PlaceId::new(self)
    }
}

impl IntoPlaceId for u32 {
    fn into_place_id(self) -> Option<PlaceId> {
        PlaceId::new(u64::from(self))
    }
}

impl IntoPlaceId for i64 {
    fn into_place_id(self) -> Option<PlaceId> {
        u64::try_from(self).ok().and_then(PlaceId::new)
    }
}

impl IntoPlaceId for i32 {
    fn into_place_id(self) -> Option<PlaceId> {
        i64::from(self).into_place_id()
    }
}

impl IntoPlaceId for &str {
    fn into_place_id(self) -> Option<PlaceId> {
        self.parse().ok()
    }
}

impl IntoPlaceId for String {
    fn into_place_id(self) -> Option<PlaceId> {
        self.as_str().into_place_id()
    }
}

impl IntoPlaceId for &String {
    fn into_place_id(self) -> Option<PlaceId> {
        self.as_str().into_place_id()
    }
}

/// Drop repeated ids, keeping the first occurrence of each.
pub fn dedup_favorites(items: impl IntoIterator<Item = PlaceId>) -> Vec<PlaceId> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Union of two favorite lists: local order first, then ids only the remote
/// side knows about, in remote order.
pub fn merge_favorites(local: &[PlaceId], remote: &[PlaceId]) -> Vec<PlaceId> {
    dedup_favorites(local.iter().chain(remote.iter()).copied())
}

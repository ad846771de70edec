//! Item domain model.
//!
//! # Responsibility
//! - Define the persisted lending record for one physical item.
//! - Own the status vocabulary shared by storage and wire formats.
//!
//! # Invariants
//! - `id` is opaque and externally assigned; core never generates one.
//! - Exactly one `ItemStatus` holds at any time.
//! - `is_flagged` is set only by Flag and cleared only by Checkout.
//! - `version` only ever increases; stores bump it on every write.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque, externally assigned item identifier (e.g. `arduino-1`).
///
/// Format is never validated beyond the non-blank check applied to commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether the identifier carries no usable characters.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lending state of an item.
///
/// Serialized with the display strings the scanning frontend already uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemStatus {
    /// On the shelf and free to borrow.
    #[serde(rename = "Available")]
    Available,
    /// Borrowed by `last_checked_out_by`.
    #[serde(rename = "Checked Out")]
    CheckedOut,
    /// Reported broken or suspicious; waiting for staff review.
    #[serde(rename = "Needs Review")]
    NeedsReview,
}

impl ItemStatus {
    pub const ALL: [Self; 3] = [Self::Available, Self::CheckedOut, Self::NeedsReview];

    /// Stable storage/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::CheckedOut => "Checked Out",
            Self::NeedsReview => "Needs Review",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-known lending state of one item as held by the item store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: ItemId,
    pub status: ItemStatus,
    /// Free-form actor name; kept across Return as borrower history.
    pub last_checked_out_by: Option<String>,
    /// Unix epoch milliseconds at which core accepted the last Checkout.
    pub last_checkout_time: Option<i64>,
    pub is_flagged: bool,
    /// Store-maintained write counter used for compare-and-swap updates.
    #[serde(default)]
    pub version: u64,
}

impl ItemRecord {
    /// Creates a never-borrowed, unflagged record in `Available` state.
    pub fn available(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            status: ItemStatus::Available,
            last_checked_out_by: None,
            last_checkout_time: None,
            is_flagged: false,
            version: 0,
        }
    }

    /// Returns whether the item is currently lent out.
    pub fn is_checked_out(&self) -> bool {
        self.status == ItemStatus::CheckedOut
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemId, ItemRecord, ItemStatus};

    #[test]
    fn status_round_trips_through_display_strings() {
        for status in ItemStatus::ALL {
            assert_eq!(ItemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ItemStatus::parse("checked_out"), None);
    }

    #[test]
    fn blank_ids_are_detected() {
        assert!(ItemId::new("  ").is_blank());
        assert!(ItemId::new("").is_blank());
        assert!(!ItemId::new("arduino-1").is_blank());
    }

    #[test]
    fn available_record_has_no_history() {
        let record = ItemRecord::available("scope-7");
        assert_eq!(record.status, ItemStatus::Available);
        assert_eq!(record.last_checked_out_by, None);
        assert_eq!(record.last_checkout_time, None);
        assert!(!record.is_flagged);
        assert!(!record.is_checked_out());
    }
}

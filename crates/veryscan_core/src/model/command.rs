//! Lending commands and the transition function.
//!
//! # Responsibility
//! - Validate command shape before any store access.
//! - Derive the partial field mutation each command applies.
//!
//! # Invariants
//! - Transitions are total: the current state never rejects a command.
//! - Each command touches only its own field subset; everything else on the
//!   record is left to the store untouched.
//! - `derive_patch` is pure; the caller supplies the acceptance time.

use crate::model::item::{ItemId, ItemRecord, ItemStatus};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Command shape errors detected before the store is contacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandValidationError {
    BlankItemId,
    BlankActorName,
}

impl Display for CommandValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankItemId => write!(f, "itemId is required"),
            Self::BlankActorName => write!(f, "actor name is required for checkout"),
        }
    }
}

impl Error for CommandValidationError {}

/// One of the three supported state-transition commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LendingCommand {
    Checkout { item_id: ItemId, actor_name: String },
    Return { item_id: ItemId },
    Flag { item_id: ItemId },
}

impl LendingCommand {
    pub fn checkout(item_id: impl Into<ItemId>, actor_name: impl Into<String>) -> Self {
        Self::Checkout {
            item_id: item_id.into(),
            actor_name: actor_name.into(),
        }
    }

    pub fn return_item(item_id: impl Into<ItemId>) -> Self {
        Self::Return {
            item_id: item_id.into(),
        }
    }

    pub fn flag(item_id: impl Into<ItemId>) -> Self {
        Self::Flag {
            item_id: item_id.into(),
        }
    }

    pub fn item_id(&self) -> &ItemId {
        match self {
            Self::Checkout { item_id, .. } | Self::Return { item_id } | Self::Flag { item_id } => {
                item_id
            }
        }
    }

    /// Short lowercase name used in log events and transport routing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Checkout { .. } => "checkout",
            Self::Return { .. } => "return",
            Self::Flag { .. } => "flag",
        }
    }

    /// Status every successful application of this command leaves behind.
    pub fn target_status(&self) -> ItemStatus {
        match self {
            Self::Checkout { .. } => ItemStatus::CheckedOut,
            Self::Return { .. } => ItemStatus::Available,
            Self::Flag { .. } => ItemStatus::NeedsReview,
        }
    }

    /// Checks required fields without touching storage.
    ///
    /// # Errors
    /// - `BlankItemId` when the item id is empty or whitespace.
    /// - `BlankActorName` when a checkout carries no actor name.
    pub fn validate(&self) -> Result<(), CommandValidationError> {
        if self.item_id().is_blank() {
            return Err(CommandValidationError::BlankItemId);
        }
        if let Self::Checkout { actor_name, .. } = self {
            if actor_name.trim().is_empty() {
                return Err(CommandValidationError::BlankActorName);
            }
        }
        Ok(())
    }

    /// Derives the field mutation for this command accepted at `now_ms`.
    pub fn derive_patch(&self, now_ms: i64) -> ItemPatch {
        let status = Some(self.target_status());
        match self {
            Self::Checkout { actor_name, .. } => ItemPatch {
                status,
                last_checked_out_by: Some(actor_name.clone()),
                last_checkout_time: Some(now_ms),
                is_flagged: Some(false),
            },
            Self::Return { .. } => ItemPatch {
                status,
                ..ItemPatch::default()
            },
            Self::Flag { .. } => ItemPatch {
                status,
                is_flagged: Some(true),
                ..ItemPatch::default()
            },
        }
    }

    /// Builds the success acknowledgement returned to callers.
    pub fn ack(&self) -> Ack {
        let item_id = self.item_id().clone();
        let message = match self {
            Self::Checkout { .. } => format!("Checked out {item_id}!"),
            Self::Return { .. } => format!("Returned {item_id}!"),
            Self::Flag { .. } => format!("Flagged {item_id} for review."),
        };
        Ack { item_id, message }
    }
}

/// Partial field mutation applied atomically by the item store.
///
/// `None` means "leave the stored value as is", never "clear it".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub status: Option<ItemStatus>,
    pub last_checked_out_by: Option<String>,
    pub last_checkout_time: Option<i64>,
    pub is_flagged: Option<bool>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.last_checked_out_by.is_none()
            && self.last_checkout_time.is_none()
            && self.is_flagged.is_none()
    }

    /// Wire names of the fields this patch sets, in a stable order.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(4);
        if self.status.is_some() {
            names.push("status");
        }
        if self.last_checked_out_by.is_some() {
            names.push("lastCheckedOutBy");
        }
        if self.last_checkout_time.is_some() {
            names.push("lastCheckoutTime");
        }
        if self.is_flagged.is_some() {
            names.push("isFlagged");
        }
        names
    }

    /// Reference merge semantics every store adapter must reproduce.
    ///
    /// Does not touch `version`; stores own that counter.
    pub fn apply_to(&self, record: &mut ItemRecord) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(actor) = &self.last_checked_out_by {
            record.last_checked_out_by = Some(actor.clone());
        }
        if let Some(time) = self.last_checkout_time {
            record.last_checkout_time = Some(time);
        }
        if let Some(flagged) = self.is_flagged {
            record.is_flagged = flagged;
        }
    }
}

/// Success acknowledgement for an applied command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub item_id: ItemId,
    pub message: String,
}

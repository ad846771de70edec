//! Lending use-case service.
//!
//! # Responsibility
//! - Validate commands, derive field mutations and push them to the store.
//! - Map store failures onto the closed `ErrorKind` vocabulary.
//! - Offer opt-in per-item serialization for callers needing linearizable
//!   transitions.
//!
//! # Invariants
//! - Invalid commands never reach the store.
//! - `Overwrite` issues exactly one `update_fields` call and no read.
//! - No store failure is retried; callers re-issue commands themselves.
//! - Actor names are user text and are never written to logs.

use crate::model::command::{Ack, CommandValidationError, LendingCommand};
use crate::model::item::{ItemId, ItemRecord};
use crate::repo::item_store::{ItemStore, StoreError};
use crate::service::item_locks::ItemLocks;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub type LendingResult<T> = Result<T, LendingError>;

/// Source of command acceptance time in Unix epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| {
                i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
            })
    }
}

impl<F> Clock for F
where
    F: Fn() -> i64,
{
    fn now_ms(&self) -> i64 {
        self()
    }
}

/// How a validated command reaches the item store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteStrategy {
    /// One unconditional partial update; concurrent writers race per field set.
    #[default]
    Overwrite,
    /// Same update, but commands on one item id run strictly one at a time.
    PerItemQueue,
    /// Read the version, then update only if nobody wrote in between.
    CompareAndSwap,
}

impl WriteStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::PerItemQueue => "per-item-queue",
            Self::CompareAndSwap => "compare-and-swap",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Some(Self::Overwrite),
            "per-item-queue" | "queue" => Some(Self::PerItemQueue),
            "compare-and-swap" | "cas" => Some(Self::CompareAndSwap),
            _ => None,
        }
    }
}

/// Closed failure vocabulary exposed to transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    StoreUnavailable,
    /// Only produced under `WriteStrategy::CompareAndSwap`.
    Conflict,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::StoreUnavailable => "store_unavailable",
            Self::Conflict => "conflict",
        }
    }
}

/// Service error for lending commands.
#[derive(Debug)]
pub enum LendingError {
    /// Command shape was rejected before any store access.
    InvalidRequest(CommandValidationError),
    /// Item id does not resolve in the store.
    NotFound(ItemId),
    /// Store call failed, timed out or was rejected.
    StoreUnavailable(StoreError),
    /// Another writer changed the item between read and conditional update.
    Conflict {
        item_id: ItemId,
        expected: u64,
        actual: u64,
    },
}

impl LendingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::Conflict { .. } => ErrorKind::Conflict,
        }
    }
}

impl Display for LendingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(err) => write!(f, "invalid request: {err}"),
            Self::NotFound(item_id) => write!(f, "item not found: {item_id}"),
            Self::StoreUnavailable(err) => write!(f, "{err}"),
            Self::Conflict {
                item_id,
                expected,
                actual,
            } => write!(
                f,
                "item {item_id} was modified concurrently (expected version {expected}, found {actual})"
            ),
        }
    }
}

impl Error for LendingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidRequest(err) => Some(err),
            Self::StoreUnavailable(err) => Some(err),
            Self::NotFound(_) | Self::Conflict { .. } => None,
        }
    }
}

impl From<CommandValidationError> for LendingError {
    fn from(value: CommandValidationError) -> Self {
        Self::InvalidRequest(value)
    }
}

impl From<StoreError> for LendingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(item_id) => Self::NotFound(item_id),
            StoreError::VersionConflict {
                id,
                expected,
                actual,
            } => Self::Conflict {
                item_id: id,
                expected,
                actual,
            },
            other => Self::StoreUnavailable(other),
        }
    }
}

/// Item lending state machine bound to an injected item store.
pub struct LendingService<S: ItemStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    strategy: WriteStrategy,
    locks: ItemLocks,
}

impl<S: ItemStore> LendingService<S> {
    /// Creates a service using wall-clock time and `WriteStrategy::Overwrite`.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: ItemStore, C: Clock> LendingService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            strategy: WriteStrategy::default(),
            locks: ItemLocks::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> WriteStrategy {
        self.strategy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lends an item to `actor_name`.
    ///
    /// # Contract
    /// - Sets status `Checked Out`, records borrower and acceptance time.
    /// - Clears `is_flagged`.
    /// - Does not check the current status; re-checkout overwrites.
    pub fn checkout(
        &self,
        item_id: impl Into<ItemId>,
        actor_name: impl Into<String>,
    ) -> LendingResult<Ack> {
        self.execute(&LendingCommand::checkout(item_id, actor_name))
    }

    /// Marks an item as back on the shelf.
    ///
    /// # Contract
    /// - Sets status `Available` only; borrower history and flag survive.
    pub fn return_item(&self, item_id: impl Into<ItemId>) -> LendingResult<Ack> {
        self.execute(&LendingCommand::return_item(item_id))
    }

    /// Reports an item for staff review.
    ///
    /// # Contract
    /// - Sets status `Needs Review` and `is_flagged = true`.
    pub fn flag(&self, item_id: impl Into<ItemId>) -> LendingResult<Ack> {
        self.execute(&LendingCommand::flag(item_id))
    }

    /// Reads the current record for display.
    ///
    /// # Errors
    /// - `InvalidRequest` for a blank id, `NotFound` when it does not resolve.
    pub fn item(&self, item_id: impl Into<ItemId>) -> LendingResult<ItemRecord> {
        let item_id = item_id.into();
        if item_id.is_blank() {
            return Err(CommandValidationError::BlankItemId.into());
        }
        self.store
            .get_by_id(&item_id)?
            .ok_or(LendingError::NotFound(item_id))
    }

    /// Validates and applies one command under the configured strategy.
    pub fn execute(&self, command: &LendingCommand) -> LendingResult<Ack> {
        let started_at = Instant::now();

        if let Err(err) = command.validate() {
            warn!(
                "event=item_{} module=service status=rejected error_kind={} error={}",
                command.name(),
                ErrorKind::InvalidRequest.as_str(),
                err
            );
            return Err(err.into());
        }

        let item_id = command.item_id();
        let result = match self.strategy {
            WriteStrategy::Overwrite => self.apply_overwrite(command),
            WriteStrategy::PerItemQueue => {
                self.locks.run(item_id, || self.apply_overwrite(command))
            }
            WriteStrategy::CompareAndSwap => self.apply_compare_and_swap(command),
        };

        match result {
            Ok(()) => {
                info!(
                    "event=item_{} module=service status=ok item_id={} strategy={} actor_len={} duration_ms={}",
                    command.name(),
                    item_id,
                    self.strategy.as_str(),
                    actor_len(command),
                    started_at.elapsed().as_millis()
                );
                Ok(command.ack())
            }
            Err(err) => {
                warn!(
                    "event=item_{} module=service status=error item_id={} strategy={} error_kind={} duration_ms={} error={}",
                    command.name(),
                    item_id,
                    self.strategy.as_str(),
                    err.kind().as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn apply_overwrite(&self, command: &LendingCommand) -> LendingResult<()> {
        let patch = command.derive_patch(self.clock.now_ms());
        self.store.update_fields(command.item_id(), &patch)?;
        Ok(())
    }

    fn apply_compare_and_swap(&self, command: &LendingCommand) -> LendingResult<()> {
        let item_id = command.item_id();
        let current = self
            .store
            .get_by_id(item_id)?
            .ok_or_else(|| LendingError::NotFound(item_id.clone()))?;
        let patch = command.derive_patch(self.clock.now_ms());
        self.store
            .update_fields_if_version(item_id, current.version, &patch)?;
        Ok(())
    }
}

fn actor_len(command: &LendingCommand) -> usize {
    match command {
        LendingCommand::Checkout { actor_name, .. } => actor_name.chars().count(),
        LendingCommand::Return { .. } | LendingCommand::Flag { .. } => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, LendingError, WriteStrategy};
    use crate::model::item::ItemId;
    use crate::repo::item_store::StoreError;

    #[test]
    fn strategy_names_round_trip() {
        for strategy in [
            WriteStrategy::Overwrite,
            WriteStrategy::PerItemQueue,
            WriteStrategy::CompareAndSwap,
        ] {
            assert_eq!(WriteStrategy::parse(strategy.as_str()), Some(strategy));
        }
        assert_eq!(WriteStrategy::parse(" CAS "), Some(WriteStrategy::CompareAndSwap));
        assert_eq!(WriteStrategy::parse("lock-everything"), None);
    }

    #[test]
    fn store_errors_map_onto_closed_kinds() {
        let not_found: LendingError = StoreError::NotFound(ItemId::new("x")).into();
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let conflict: LendingError = StoreError::VersionConflict {
            id: ItemId::new("x"),
            expected: 1,
            actual: 2,
        }
        .into();
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let unavailable: LendingError = StoreError::Unavailable("timeout".to_string()).into();
        assert_eq!(unavailable.kind(), ErrorKind::StoreUnavailable);

        let corrupt: LendingError = StoreError::InvalidData("bad row".to_string()).into();
        assert_eq!(corrupt.kind(), ErrorKind::StoreUnavailable);
    }
}

// The two-step tracking flow: pick a size, then pick a monster.

use std::sync::Arc;

use crate::catalog::{CatalogClient, CatalogError, MonsterRecord};
use crate::db::{Database, SizeTier};
use crate::metrics;
use crate::session::SessionStore;

/// Why a flow step could not complete. `NoSizeSelected` is a recoverable
/// user error (wrong step order, or the process restarted and lost the
/// pending entry); the rest are downstream faults.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("no size selected yet")]
    NoSizeSelected,
    #[error("catalog returned no monsters")]
    EmptyCatalog,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Result of the size-selection step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginOutcome {
    /// Present these monsters for the second step. `truncated` is set when
    /// the remaining catalog exceeded the menu cap and entries were dropped.
    Menu {
        options: Vec<String>,
        truncated: bool,
    },
    /// Every catalog monster is already logged at the chosen size.
    AllTracked,
}

/// Result of the monster-selection step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Recorded { monster: String, size: SizeTier },
    /// The triple already existed; the store left the original row in place.
    AlreadyTracked { monster: String, size: SizeTier },
}

/// Orchestrates the `Idle -> SizeChosen -> Committed` selection states.
///
/// Each step is an independent inbound event; the pause between them is a
/// human choosing a menu option, not a program-level await. The committed
/// state exists only as the durable encounter row.
#[derive(Clone)]
pub struct SelectionFlow {
    db: Arc<Database>,
    catalog: CatalogClient,
    sessions: SessionStore,
    menu_cap: usize,
}

impl SelectionFlow {
    pub fn new(
        db: Arc<Database>,
        catalog: CatalogClient,
        sessions: SessionStore,
        menu_cap: usize,
    ) -> Self {
        Self {
            db,
            catalog,
            sessions,
            menu_cap,
        }
    }

    /// `Idle -> SizeChosen`: remember the size, fetch the catalog in the
    /// user's language and offer the monsters not yet logged at that size.
    pub async fn begin(&self, user_id: &str, size: SizeTier) -> Result<BeginOutcome, FlowError> {
        let language = self.db.get_language(user_id).await?;
        let catalog = self.catalog.fetch_catalog(language).await?;
        if catalog.is_empty() {
            return Err(FlowError::EmptyCatalog);
        }

        let tracked = self.db.tracked_names_for_size(user_id, size).await?;

        // Overwrite any stale pending entry from an abandoned flow.
        self.sessions.put_size(user_id, size);
        tracing::info!(user_id, size = %size, "size selected, awaiting monster choice");

        let remaining = remaining_monsters(&catalog, &tracked);
        if remaining.is_empty() {
            return Ok(BeginOutcome::AllTracked);
        }

        let truncated = remaining.len() > self.menu_cap;
        let mut options = remaining;
        options.truncate(self.menu_cap);
        Ok(BeginOutcome::Menu { options, truncated })
    }

    /// `SizeChosen -> Committed`: record the encounter, then clear the
    /// pending entry. Rejected when no size selection is pending. The
    /// entry is cleared only once the write succeeds; a storage fault
    /// leaves it in place so the user can retry without restarting.
    pub async fn commit(
        &self,
        user_id: &str,
        monster_name: &str,
    ) -> Result<CommitOutcome, FlowError> {
        let size = self
            .sessions
            .peek_size(user_id)
            .ok_or(FlowError::NoSizeSelected)?;

        let inserted = self.db.record_encounter(user_id, monster_name, size).await?;
        self.sessions.clear(user_id);
        let monster = monster_name.to_lowercase();
        if inserted {
            metrics::ENCOUNTERS_RECORDED_TOTAL
                .with_label_values(&[size.as_str()])
                .inc();
            tracing::info!(user_id, %monster, size = %size, "encounter recorded");
            Ok(CommitOutcome::Recorded { monster, size })
        } else {
            tracing::info!(user_id, %monster, size = %size, "encounter already tracked");
            Ok(CommitOutcome::AlreadyTracked { monster, size })
        }
    }
}

/// Catalog entries the user has not logged at the chosen size, in catalog
/// order. Matching is case-insensitive; `tracked` holds lowercased names.
pub fn remaining_monsters(catalog: &[MonsterRecord], tracked: &[String]) -> Vec<String> {
    catalog
        .iter()
        .filter(|m| !tracked.contains(&m.name.to_lowercase()))
        .map(|m| m.name.clone())
        .collect()
}

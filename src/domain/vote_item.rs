//! Voting item: the unified poll / prediction / wager aggregate.
//!
//! Polls, predictions, and tournament wagers share one shape and one
//! contract: at most one vote per user per item, aggregate counters that
//! always equal the size of the per-item vote registry, and an
//! `active → resolved/closed` lifecycle.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ItemId;
use crate::error::FanstageError;

/// Discriminator for the three voting item flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Opinion poll; no stake, no payout.
    Poll,
    /// Stream prediction; resolution declares the true outcome.
    Prediction,
    /// Tournament wager; votes carry a point stake debited up front.
    Wager,
}

/// Lifecycle state of a voting item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Accepting votes.
    Active,
    /// Ended with a declared result.
    Resolved,
    /// Ended without a result (e.g. deleted by an admin).
    Closed,
}

/// One selectable option with its running vote counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteOption {
    /// Display label, also the wire identifier for choices.
    pub label: String,
    /// Number of votes cast for this option.
    pub votes: u64,
}

/// A poll, prediction, or wager with its per-item vote registry.
///
/// Invariant: `sum(option.votes) == votes.len()` at all times. Both
/// sides of the equality are only ever mutated together under the same
/// `&mut self`, inside the per-item lock held by the ledger.
#[derive(Debug, Clone)]
pub struct VoteItem {
    /// Unique identifier (immutable after creation).
    pub item_id: ItemId,
    /// Item flavor (immutable after creation).
    pub kind: ItemKind,
    /// Question or title shown to viewers.
    pub title: String,
    /// Option set with running counters. Always at least two entries.
    pub options: Vec<VoteOption>,
    /// Per-item vote registry: user id → option index. The dedup key
    /// for the at-most-once voting invariant.
    votes: HashMap<String, usize>,
    /// Stake each voter put up (wagers only).
    stakes: HashMap<String, i64>,
    /// Lifecycle state.
    pub status: ItemStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set when the item leaves the active state.
    pub ended_at: Option<DateTime<Utc>>,
    /// Index of the declared result, once resolved.
    pub result: Option<usize>,
}

impl VoteItem {
    /// Creates a new active item with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::InvalidRequest`] if fewer than two
    /// options are given, an option label is empty, or labels collide.
    pub fn new(kind: ItemKind, title: String, labels: Vec<String>) -> Result<Self, FanstageError> {
        if labels.len() < 2 {
            return Err(FanstageError::InvalidRequest(
                "an item needs at least two options".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for label in &labels {
            if label.trim().is_empty() {
                return Err(FanstageError::InvalidRequest(
                    "option labels must not be empty".to_string(),
                ));
            }
            if !seen.insert(label.as_str()) {
                return Err(FanstageError::InvalidRequest(format!(
                    "duplicate option label: {label}"
                )));
            }
        }
        Ok(Self {
            item_id: ItemId::new(),
            kind,
            title,
            options: labels
                .into_iter()
                .map(|label| VoteOption { label, votes: 0 })
                .collect(),
            votes: HashMap::new(),
            stakes: HashMap::new(),
            status: ItemStatus::Active,
            created_at: Utc::now(),
            ended_at: None,
            result: None,
        })
    }

    /// Looks up the option index for a choice label.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::InvalidChoice`] if the label is not
    /// among the item's options.
    pub fn option_index(&self, label: &str) -> Result<usize, FanstageError> {
        self.options
            .iter()
            .position(|o| o.label == label)
            .ok_or_else(|| FanstageError::InvalidChoice(label.to_string()))
    }

    /// Returns `true` if the user already has an entry in the vote
    /// registry.
    #[must_use]
    pub fn has_voted(&self, user_id: &str) -> bool {
        self.votes.contains_key(user_id)
    }

    /// Registers a vote: one registry entry plus exactly one counter
    /// increment, under the same `&mut self`.
    ///
    /// # Errors
    ///
    /// - [`FanstageError::ItemNotActive`] if the item stopped accepting
    ///   votes.
    /// - [`FanstageError::DuplicateVote`] if the user already voted; all
    ///   counters are left unchanged.
    /// - [`FanstageError::InvalidChoice`] if the index is out of range.
    pub fn register_vote(&mut self, user_id: &str, choice: usize) -> Result<(), FanstageError> {
        if self.status != ItemStatus::Active {
            return Err(FanstageError::ItemNotActive);
        }
        if self.votes.contains_key(user_id) {
            return Err(FanstageError::DuplicateVote(user_id.to_string()));
        }
        let option = self
            .options
            .get_mut(choice)
            .ok_or_else(|| FanstageError::InvalidChoice(format!("option index {choice}")))?;
        option.votes = option.votes.saturating_add(1);
        self.votes.insert(user_id.to_string(), choice);
        Ok(())
    }

    /// Records the stake a voter put up. Wagers only; called together
    /// with [`Self::register_vote`] under the item lock.
    pub fn record_stake(&mut self, user_id: &str, stake: i64) {
        self.stakes.insert(user_id.to_string(), stake);
    }

    /// Resolves the item with a declared result.
    ///
    /// # Errors
    ///
    /// - [`FanstageError::ItemNotActive`] if the item already ended.
    /// - [`FanstageError::InvalidResult`] if the result label is not
    ///   among the options.
    pub fn resolve(&mut self, result_label: &str) -> Result<ResolutionSummary, FanstageError> {
        if self.status != ItemStatus::Active {
            return Err(FanstageError::ItemNotActive);
        }
        let result = self
            .options
            .iter()
            .position(|o| o.label == result_label)
            .ok_or_else(|| FanstageError::InvalidResult(result_label.to_string()))?;
        self.status = ItemStatus::Resolved;
        self.ended_at = Some(Utc::now());
        self.result = Some(result);
        Ok(self.summary(result))
    }

    /// Closes the item without a declared result.
    pub fn close(&mut self) {
        if self.status == ItemStatus::Active {
            self.status = ItemStatus::Closed;
            self.ended_at = Some(Utc::now());
        }
    }

    /// Total votes across all options. Equal to the registry size.
    #[must_use]
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }

    /// Number of entries in the per-item vote registry.
    #[must_use]
    pub fn registry_len(&self) -> usize {
        self.votes.len()
    }

    /// Voters who picked the winning option, with their stakes.
    /// Empty for unresolved items.
    #[must_use]
    pub fn winning_stakes(&self) -> Vec<(String, i64)> {
        let Some(result) = self.result else {
            return Vec::new();
        };
        self.votes
            .iter()
            .filter(|(_, choice)| **choice == result)
            .map(|(user, _)| (user.clone(), self.stakes.get(user).copied().unwrap_or(0)))
            .collect()
    }

    /// All recorded stakes, for refunds when a live wager is deleted.
    #[must_use]
    pub fn all_stakes(&self) -> Vec<(String, i64)> {
        self.stakes
            .iter()
            .map(|(user, stake)| (user.clone(), *stake))
            .collect()
    }

    /// Public aggregate view: counts only, never the voter map.
    #[must_use]
    pub fn view(&self) -> ItemView {
        ItemView {
            item_id: self.item_id,
            kind: self.kind,
            title: self.title.clone(),
            options: self.options.clone(),
            total_votes: self.total_votes(),
            active: self.status == ItemStatus::Active,
            created_at: self.created_at,
        }
    }

    /// Per-option breakdown with percentages. Zero total votes yields
    /// 0% for every option rather than a division error.
    #[must_use]
    pub fn breakdown(&self) -> Vec<OptionBreakdown> {
        let total = self.total_votes();
        self.options
            .iter()
            .map(|o| OptionBreakdown {
                label: o.label.clone(),
                votes: o.votes,
                percent: percent_of(o.votes, total),
            })
            .collect()
    }

    fn summary(&self, result: usize) -> ResolutionSummary {
        let total = self.total_votes();
        let matching = self
            .options
            .get(result)
            .map(|o| o.votes)
            .unwrap_or_default();
        ResolutionSummary {
            item_id: self.item_id,
            kind: self.kind,
            result: self
                .options
                .get(result)
                .map(|o| o.label.clone())
                .unwrap_or_default(),
            total_votes: total,
            accuracy_percent: percent_of(matching, total),
            breakdown: self.breakdown(),
        }
    }
}

/// Public aggregate shape echoed by vote endpoints and broadcast in
/// `item_updated` events. Individual choices stay private until
/// resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    /// Item identifier.
    pub item_id: ItemId,
    /// Item flavor.
    pub kind: ItemKind,
    /// Question or title.
    pub title: String,
    /// Options with running counters.
    pub options: Vec<VoteOption>,
    /// Total votes across all options.
    pub total_votes: u64,
    /// Whether the item still accepts votes.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One option's share of the final tally.
#[derive(Debug, Clone, Serialize)]
pub struct OptionBreakdown {
    /// Option label.
    pub label: String,
    /// Votes for this option.
    pub votes: u64,
    /// Share of the total, 0.0–100.0.
    pub percent: f64,
}

/// Full resolution report broadcast when an item is resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionSummary {
    /// Item identifier.
    pub item_id: ItemId,
    /// Item flavor.
    pub kind: ItemKind,
    /// Declared winning option label.
    pub result: String,
    /// Total votes cast.
    pub total_votes: u64,
    /// Share of voters who picked the declared result.
    pub accuracy_percent: f64,
    /// Per-option percentages.
    pub breakdown: Vec<OptionBreakdown>,
}

/// Percentage of `part` in `total`, 0.0 when `total` is zero.
fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = part as f64 / total as f64 * 100.0;
    pct
}

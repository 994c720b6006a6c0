//! King-of-the-hill tournament engine.
//!
//! A run starts from a shuffled list of N items. The first two face off;
//! the winner stays on and meets the next unseen item until the list is
//! exhausted. A run therefore always takes exactly N-1 votes.
//!
//! [`TournamentState`] is a plain value: every transition returns a new
//! state and leaves the old one untouched, so a caller (or an HTTP client)
//! can hold it between rounds without any server-side session.

pub mod session;

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CollectionId, Item, ItemId};

pub use session::{advance, Advance};

/// Errors raised by the engine. All of them leave the state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TournamentError {
    #[error("A tournament needs at least 2 items, got {0}")]
    NotEnoughItems(usize),

    #[error("Item {0} is not part of the current pair")]
    NotInCurrentPair(ItemId),

    #[error("The tournament is already complete")]
    AlreadyComplete,
}

/// One round's outcome, to be recorded in the stats store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEvent {
    pub collection_id: CollectionId,
    pub winner_id: ItemId,
    pub loser_id: ItemId,
}

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Phase {
    AwaitingVote {
        pair: (Item, Item),
        remaining: VecDeque<Item>,
    },
    Complete {
        survivor: Item,
    },
}

/// Progress numbers for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// N - remaining - 1: the 1-based number of the battle on screen, or
    /// N-1 once the run is complete.
    pub round: usize,
    pub votes_cast: usize,
    pub total_rounds: usize,
}

/// Complete state of one tournament run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentState {
    pub run_id: Uuid,
    pub collection_id: CollectionId,
    /// The deduplicated list the run was started from, used by restarts.
    pub entrants: Vec<Item>,
    pub votes_cast: usize,
    pub phase: Phase,
}

/// Result of a successful vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: TournamentState,
    pub vote: VoteEvent,
}

impl TournamentState {
    /// Shuffle `items` and set up the first pair.
    pub fn start<R: Rng + ?Sized>(
        collection_id: CollectionId,
        items: Vec<Item>,
        rng: &mut R,
    ) -> Result<Self, TournamentError> {
        let mut order = items.clone();
        order.shuffle(rng);
        Self::from_order(collection_id, items, order)
    }

    /// Set up a run that plays `order` exactly as given.
    fn from_order(
        collection_id: CollectionId,
        entrants: Vec<Item>,
        order: Vec<Item>,
    ) -> Result<Self, TournamentError> {
        let mut remaining: VecDeque<Item> = order.into();
        let (Some(first), Some(second)) = (remaining.pop_front(), remaining.pop_front()) else {
            return Err(TournamentError::NotEnoughItems(entrants.len()));
        };

        Ok(Self {
            run_id: Uuid::new_v4(),
            collection_id,
            entrants,
            votes_cast: 0,
            phase: Phase::AwaitingVote {
                pair: (first, second),
                remaining,
            },
        })
    }

    /// Begin a fresh, independent run over the same entrants.
    ///
    /// Fails only for a state that was built by hand with fewer than two
    /// entrants.
    pub fn restart<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Self, TournamentError> {
        Self::start(self.collection_id.clone(), self.entrants.clone(), rng)
    }

    /// Pick `winner_id` from the current pair.
    ///
    /// The other pair member loses. The winner meets the next remaining
    /// item, or becomes the survivor if none are left.
    pub fn cast_vote(&self, winner_id: &ItemId) -> Result<Transition, TournamentError> {
        let Phase::AwaitingVote { pair, remaining } = &self.phase else {
            return Err(TournamentError::AlreadyComplete);
        };

        let (winner, loser) = if pair.0.id == *winner_id {
            (&pair.0, &pair.1)
        } else if pair.1.id == *winner_id {
            (&pair.1, &pair.0)
        } else {
            return Err(TournamentError::NotInCurrentPair(winner_id.clone()));
        };

        let vote = VoteEvent {
            collection_id: self.collection_id.clone(),
            winner_id: winner.id.clone(),
            loser_id: loser.id.clone(),
        };

        let mut remaining = remaining.clone();
        let phase = match remaining.pop_front() {
            Some(next) => Phase::AwaitingVote {
                pair: (winner.clone(), next),
                remaining,
            },
            None => Phase::Complete {
                survivor: winner.clone(),
            },
        };

        let state = Self {
            run_id: self.run_id,
            collection_id: self.collection_id.clone(),
            entrants: self.entrants.clone(),
            votes_cast: self.votes_cast + 1,
            phase,
        };
        Ok(Transition { state, vote })
    }

    pub fn current_pair(&self) -> Option<(&Item, &Item)> {
        match &self.phase {
            Phase::AwaitingVote { pair, .. } => Some((&pair.0, &pair.1)),
            Phase::Complete { .. } => None,
        }
    }

    pub fn remaining(&self) -> usize {
        match &self.phase {
            Phase::AwaitingVote { remaining, .. } => remaining.len(),
            Phase::Complete { .. } => 0,
        }
    }

    pub fn survivor(&self) -> Option<&Item> {
        match &self.phase {
            Phase::Complete { survivor } => Some(survivor),
            Phase::AwaitingVote { .. } => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Complete { .. })
    }

    pub fn progress(&self) -> Progress {
        let n = self.entrants.len();
        Progress {
            round: n.saturating_sub(self.remaining() + 1),
            votes_cast: self.votes_cast,
            total_rounds: n.saturating_sub(1),
        }
    }
}

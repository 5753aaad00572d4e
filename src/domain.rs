//! Domain models for the practice core: exercise kinds, per-card core
//! progress, card status, and the card itself.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

pub type CardId = String;
pub type OwnerId = String;
pub type CategoryId = String;

/// The exercise types a card can be practiced with.
///
/// The first four are the core types; completing all of them moves a card out
/// of learning. Reading comprehension is auxiliary and never affects status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    SentenceCompletion,
    MultipleChoice,
    ListenAndFill,
    ListenAndChoose,
    ReadingComprehension,
}

impl ExerciseKind {
    /// The core types, in the order their bits are laid out in [`CoreProgress`].
    pub const CORE: [ExerciseKind; 4] = [
        ExerciseKind::SentenceCompletion,
        ExerciseKind::MultipleChoice,
        ExerciseKind::ListenAndFill,
        ExerciseKind::ListenAndChoose,
    ];

    pub fn is_core(self) -> bool {
        !matches!(self, ExerciseKind::ReadingComprehension)
    }

    /// Wire/LOG tag, e.g. `sentence-completion`.
    pub fn as_str(self) -> &'static str {
        match self {
            ExerciseKind::SentenceCompletion => "sentence-completion",
            ExerciseKind::MultipleChoice => "multiple-choice",
            ExerciseKind::ListenAndFill => "listen-and-fill",
            ExerciseKind::ListenAndChoose => "listen-and-choose",
            ExerciseKind::ReadingComprehension => "reading-comprehension",
        }
    }

    fn core_bit(self) -> Option<u8> {
        Self::CORE.iter().position(|k| *k == self).map(|i| 1 << i)
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sentence-completion" => Ok(ExerciseKind::SentenceCompletion),
            "multiple-choice" => Ok(ExerciseKind::MultipleChoice),
            "listen-and-fill" => Ok(ExerciseKind::ListenAndFill),
            "listen-and-choose" => Ok(ExerciseKind::ListenAndChoose),
            "reading-comprehension" => Ok(ExerciseKind::ReadingComprehension),
            other => Err(Error::InvalidArgument(format!(
                "unknown exercise type: {other}"
            ))),
        }
    }
}

/// Which of the four core exercise types a card has been answered correctly
/// with during the current learning pass.
///
/// Serialized as the sorted list of completed kind tags. The auxiliary kind is
/// never a member; inserting it is a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ExerciseKind>", into = "Vec<ExerciseKind>")]
pub struct CoreProgress(u8);

impl CoreProgress {
    pub fn contains(self, kind: ExerciseKind) -> bool {
        kind.core_bit().map(|b| self.0 & b != 0).unwrap_or(false)
    }

    /// Marks `kind` completed. Returns whether the set changed.
    pub fn insert(&mut self, kind: ExerciseKind) -> bool {
        match kind.core_bit() {
            Some(b) if self.0 & b == 0 => {
                self.0 |= b;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_complete(self) -> bool {
        self.count() == ExerciseKind::CORE.len()
    }

    /// Completed kinds in the fixed core order.
    pub fn kinds(self) -> impl Iterator<Item = ExerciseKind> {
        ExerciseKind::CORE.into_iter().filter(move |k| self.contains(*k))
    }
}

impl From<CoreProgress> for Vec<ExerciseKind> {
    fn from(p: CoreProgress) -> Self {
        p.kinds().collect()
    }
}

impl TryFrom<Vec<ExerciseKind>> for CoreProgress {
    type Error = String;

    fn try_from(kinds: Vec<ExerciseKind>) -> Result<Self, Self::Error> {
        let mut p = CoreProgress::default();
        for kind in kinds {
            if !kind.is_core() {
                return Err(format!("{kind} is not a core exercise type"));
            }
            p.insert(kind);
        }
        Ok(p)
    }
}

/// Lifecycle bucket of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Learning,
    Review,
}

impl CardStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CardStatus::Learning => "learning",
            CardStatus::Review => "review",
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category filter for selection requests.
///
/// `Uncategorized` matches only cards without a category; a missing scope
/// (`Option::None` at the call sites) matches every card of the owner.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CategoryScope {
    Uncategorized,
    Category(CategoryId),
}

impl CategoryScope {
    pub fn matches(&self, category_id: Option<&str>) -> bool {
        match self {
            CategoryScope::Uncategorized => category_id.is_none(),
            CategoryScope::Category(id) => category_id == Some(id.as_str()),
        }
    }
}

/// A vocabulary card with its learning state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub owner_id: OwnerId,
    pub category_id: Option<CategoryId>,
    /// The word or phrase being learned.
    pub text: String,
    pub translation: String,
    pub status: CardStatus,
    pub core_progress: CoreProgress,
    /// Reading-comprehension rotation flag: shown already in the current cycle.
    pub reading_used: bool,
    pub last_reviewed_at: DateTime<Utc>,
    pub added_to_learning_at: DateTime<Utc>,
    /// Set exactly when the card transitions to review; cleared on reset.
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Card {
    /// A fresh learning card with a minted id and zeroed progress.
    pub fn new(
        owner_id: OwnerId,
        category_id: Option<CategoryId>,
        text: String,
        translation: String,
        now: DateTime<Utc>,
    ) -> Self {
        Card {
            id: Uuid::new_v4().to_string(),
            owner_id,
            category_id,
            text,
            translation,
            status: CardStatus::Learning,
            core_progress: CoreProgress::default(),
            reading_used: false,
            last_reviewed_at: now,
            added_to_learning_at: now,
            reviewed_at: None,
        }
    }

    /// Share of core exercise types completed, rounded to whole percent.
    pub fn progress_percent(&self) -> u8 {
        let total = ExerciseKind::CORE.len();
        ((self.core_progress.count() * 100 + total / 2) / total) as u8
    }
}

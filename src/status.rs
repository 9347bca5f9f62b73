use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Canonical checkpoint order. Every transition rule is defined in terms of
/// position in this table, never by string comparison.
pub const STATUS_FLOW: [CollectionStatus; 4] = [
    CollectionStatus::CheckedIn,
    CollectionStatus::Loading,
    CollectionStatus::Loaded,
    CollectionStatus::CheckedOut,
];

/// A checkpoint in the yard workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionStatus {
    CheckedIn,
    Loading,
    Loaded,
    CheckedOut,
}

impl CollectionStatus {
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::CheckedIn => 0,
            Self::Loading => 1,
            Self::Loaded => 2,
            Self::CheckedOut => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckedIn => "CHECKED_IN",
            Self::Loading => "LOADING",
            Self::Loaded => "LOADED",
            Self::CheckedOut => "CHECKED_OUT",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::CheckedIn => "Checked in",
            Self::Loading => "Loading",
            Self::Loaded => "Loaded",
            Self::CheckedOut => "Checked out",
        }
    }

    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "CHECKED_IN" => Some(Self::CheckedIn),
            "LOADING" | "LOADING_IN_PROGRESS" => Some(Self::Loading),
            "LOADED" => Some(Self::Loaded),
            "CHECKED_OUT" => Some(Self::CheckedOut),
            _ => None,
        }
    }

    /// `CHECKED_OUT` is terminal; nothing advances past it.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::CheckedOut)
    }

    /// The single legal next checkpoint, or `None` from the terminal status.
    /// There are no branching transitions.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        STATUS_FLOW.get(self.index() + 1).copied()
    }

    /// Like [`next`](Self::next), but the terminal status is an error rather
    /// than a silent no-op.
    pub fn advance(self) -> Result<Self, TransitionError> {
        self.next()
            .ok_or(TransitionError::Terminal { status: self })
    }

    /// Statuses an operator may correct to: the window within one step of the
    /// current checkpoint, in canonical order (the current status included).
    #[must_use]
    pub fn editable_window(self) -> Vec<Self> {
        let current = self.index();
        STATUS_FLOW
            .iter()
            .copied()
            .filter(|status| status.index().abs_diff(current) <= 1)
            .collect()
    }

    pub fn validate_edit(self, to: Self) -> Result<(), TransitionError> {
        if self == to {
            return Err(TransitionError::SameStatus);
        }
        if to.index().abs_diff(self.index()) > 1 {
            return Err(TransitionError::OutsideEditableWindow { from: self, to });
        }
        Ok(())
    }

    /// The collection timestamp this checkpoint stamps when entered.
    #[must_use]
    pub const fn timestamp_field(self) -> TimestampField {
        match self {
            Self::CheckedIn => TimestampField::CheckedInAt,
            Self::Loading => TimestampField::StartedLoadingAt,
            Self::Loaded => TimestampField::FinishedLoadingAt,
            Self::CheckedOut => TimestampField::CheckedOutAt,
        }
    }
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One checkpoint timestamp slot on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampField {
    CheckedInAt,
    StartedLoadingAt,
    FinishedLoadingAt,
    CheckedOutAt,
}

impl TimestampField {
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::CheckedInAt => "checkedInAt",
            Self::StartedLoadingAt => "startedLoadingAt",
            Self::FinishedLoadingAt => "finishedLoadingAt",
            Self::CheckedOutAt => "checkedOutAt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("collection has checked out and cannot be advanced further")]
    Terminal { status: CollectionStatus },
    #[error("collection is already in the requested status")]
    SameStatus,
    #[error("cannot move from {from} to {to}: more than one step away")]
    OutsideEditableWindow {
        from: CollectionStatus,
        to: CollectionStatus,
    },
}

//! Per-operation bookkeeping for the five asynchronous operation classes.
//! The coordinator only records what was dispatched and how it resolved;
//! admission control (e.g. refusing a duplicate submit while one is in
//! flight) belongs to the component layer.

use serde::{Deserialize, Serialize};

use crate::model::CollectionId;
use crate::status::CollectionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// State machine for one operation class: `idle → loading → (succeeded |
/// failed)`. Terminal phases are cleared only by [`RequestState::reset`] or
/// by a fresh `loading` transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestState {
    phase: RequestPhase,
    error: Option<String>,
}

impl RequestState {
    pub fn start(&mut self) {
        self.phase = RequestPhase::Loading;
        self.error = None;
    }

    pub fn succeed(&mut self) {
        self.phase = RequestPhase::Succeeded;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.phase = RequestPhase::Failed;
        self.error = Some(message.into());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub const fn phase(&self) -> RequestPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.phase, RequestPhase::Loading)
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.phase, RequestPhase::Failed)
    }

    #[must_use]
    pub const fn has_succeeded(&self) -> bool {
        matches!(self.phase, RequestPhase::Succeeded)
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Identifies which status entry's comment form an add-comment dispatch
/// belongs to. Compared structurally: a collection may hold several entries
/// for the same status, so the entry timestamp is part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentTarget {
    pub collection_id: CollectionId,
    pub status: CollectionStatus,
    pub status_timestamp: String,
}

/// Add-comment bookkeeping: the plain request state plus the target captured
/// at dispatch, so concurrently open comment forms never show each other's
/// spinner or error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRequests {
    state: RequestState,
    target: Option<CommentTarget>,
}

impl CommentRequests {
    pub fn start(&mut self, target: CommentTarget) {
        self.state.start();
        self.target = Some(target);
    }

    /// Marks success if `target` is still the tracked dispatch. A stale
    /// completion (the user has since dispatched for a different entry)
    /// leaves the phase untouched.
    pub fn succeed(&mut self, target: &CommentTarget) -> bool {
        if self.target.as_ref() == Some(target) {
            self.state.succeed();
            true
        } else {
            false
        }
    }

    /// Marks failure if `target` is still the tracked dispatch.
    pub fn fail(&mut self, target: &CommentTarget, message: impl Into<String>) -> bool {
        if self.target.as_ref() == Some(target) {
            self.state.fail(message);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.target = None;
    }

    #[must_use]
    pub const fn state(&self) -> &RequestState {
        &self.state
    }

    #[must_use]
    pub const fn target(&self) -> Option<&CommentTarget> {
        self.target.as_ref()
    }

    /// Whether the form identified by `target` should render a spinner.
    #[must_use]
    pub fn is_loading_for(&self, target: &CommentTarget) -> bool {
        self.state.is_loading() && self.target.as_ref() == Some(target)
    }

    /// The error message owned by the form identified by `target`, if any.
    #[must_use]
    pub fn error_for(&self, target: &CommentTarget) -> Option<&str> {
        if self.state.is_failed() && self.target.as_ref() == Some(target) {
            self.state.error()
        } else {
            None
        }
    }
}

/// The five asynchronous operation classes tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationClass {
    FetchAll,
    Create,
    UpdateStatus,
    AddComment,
    Delete,
}

/// One state per operation class. The create class carries an extra success
/// message so the UI can show a transient confirmation distinct from
/// loading/error feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requests {
    pub fetch_all: RequestState,
    pub create: RequestState,
    pub create_success: Option<String>,
    pub update_status: RequestState,
    pub delete: RequestState,
    pub add_comment: CommentRequests,
}

impl Requests {
    /// Explicit UI-driven reset, e.g. when a form or modal closes or reopens.
    pub fn reset(&mut self, class: OperationClass) {
        match class {
            OperationClass::FetchAll => self.fetch_all.reset(),
            OperationClass::Create => {
                self.create.reset();
                self.create_success = None;
            }
            OperationClass::UpdateStatus => self.update_status.reset(),
            OperationClass::AddComment => self.add_comment.reset(),
            OperationClass::Delete => self.delete.reset(),
        }
    }
}

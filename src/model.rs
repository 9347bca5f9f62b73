//! The collection aggregate, its drafts, and the in-memory store the
//! lifecycle orchestrator owns. Wire names are camelCase to match the yard
//! API's JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::request::Requests;
use crate::status::{CollectionStatus, TimestampField, STATUS_FLOW};

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(CollectionId);
typed_id!(UserId);
typed_id!(CommentId);

impl CommentId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

// --- Aggregate parts ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub text: String,
    pub timestamp: String,
}

/// One row of a collection's status history. Entries are append-only and
/// their insertion order is chronological order; the timestamp is unique
/// within a collection and identifies the entry together with the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub status: CollectionStatus,
    pub timestamp: String,
    pub updated_by_user_id: UserId,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Whether a backward status move restamps the re-entered checkpoint or
/// leaves its original timestamp in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewindPolicy {
    /// A checkpoint revisited by a backward move keeps its original stamp.
    #[default]
    KeepOriginal,
    /// A backward move restamps the re-entered checkpoint with the current
    /// time.
    Restamp,
}

/// One tracked vehicle/material pickup moving through the checkpoint
/// workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: CollectionId,
    pub material_name: String,
    pub customer_name: String,
    pub collection_ref_num: String,
    #[serde(default)]
    pub lorry_reg_num: Option<String>,
    pub current_status: CollectionStatus,
    #[serde(default)]
    pub checked_in_at: Option<String>,
    #[serde(default)]
    pub started_loading_at: Option<String>,
    #[serde(default)]
    pub finished_loading_at: Option<String>,
    #[serde(default)]
    pub checked_out_at: Option<String>,
    #[serde(default)]
    pub status_history: Vec<StatusEntry>,
}

impl Collection {
    #[must_use]
    pub fn timestamp_for(&self, field: TimestampField) -> Option<&str> {
        match field {
            TimestampField::CheckedInAt => self.checked_in_at.as_deref(),
            TimestampField::StartedLoadingAt => self.started_loading_at.as_deref(),
            TimestampField::FinishedLoadingAt => self.finished_loading_at.as_deref(),
            TimestampField::CheckedOutAt => self.checked_out_at.as_deref(),
        }
    }

    fn timestamp_slot(&mut self, field: TimestampField) -> &mut Option<String> {
        match field {
            TimestampField::CheckedInAt => &mut self.checked_in_at,
            TimestampField::StartedLoadingAt => &mut self.started_loading_at,
            TimestampField::FinishedLoadingAt => &mut self.finished_loading_at,
            TimestampField::CheckedOutAt => &mut self.checked_out_at,
        }
    }

    /// Locates a history entry by status AND entry timestamp. A collection
    /// may revisit a checkpoint and hold several entries for the same
    /// status, so the status name alone is not an identity.
    #[must_use]
    pub fn status_entry(&self, status: CollectionStatus, timestamp: &str) -> Option<&StatusEntry> {
        self.status_history
            .iter()
            .find(|entry| entry.status == status && entry.timestamp == timestamp)
    }

    pub fn status_entry_mut(
        &mut self,
        status: CollectionStatus,
        timestamp: &str,
    ) -> Option<&mut StatusEntry> {
        self.status_history
            .iter_mut()
            .find(|entry| entry.status == status && entry.timestamp == timestamp)
    }

    /// Moves the collection to `new_status`, keeping the checkpoint
    /// timestamps consistent with it: the entered checkpoint is stamped only
    /// if it has no stamp yet, and a backward move nulls every checkpoint
    /// strictly after the new one. A history entry is appended, carrying the
    /// optional comment.
    pub fn apply_status_change(
        &mut self,
        new_status: CollectionStatus,
        timestamp_iso: &str,
        updated_by: &UserId,
        comment: Option<&str>,
        rewind: RewindPolicy,
    ) {
        let old_index = self.current_status.index();
        let new_index = new_status.index();

        if new_index < old_index {
            for status in &STATUS_FLOW[new_index + 1..] {
                *self.timestamp_slot(status.timestamp_field()) = None;
            }
            if matches!(rewind, RewindPolicy::Restamp) {
                *self.timestamp_slot(new_status.timestamp_field()) = None;
            }
        }

        let slot = self.timestamp_slot(new_status.timestamp_field());
        if slot.is_none() {
            *slot = Some(timestamp_iso.to_owned());
        }

        self.current_status = new_status;

        let comments = comment
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(|text| {
                vec![Comment {
                    id: CommentId::generate(),
                    user_id: updated_by.clone(),
                    text: text.to_owned(),
                    timestamp: timestamp_iso.to_owned(),
                }]
            })
            .unwrap_or_default();

        self.status_history.push(StatusEntry {
            status: new_status,
            timestamp: timestamp_iso.to_owned(),
            updated_by_user_id: updated_by.clone(),
            comments,
        });
    }
}

// --- Drafts & validation ---

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("comment text cannot be empty")]
    EmptyComment,
}

/// Operator input for checking a new collection in. The server assigns the
/// id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDraft {
    pub material_name: String,
    pub customer_name: String,
    pub collection_ref_num: String,
    #[serde(default)]
    pub lorry_reg_num: Option<String>,
    pub updated_by_user_id: UserId,
}

impl CollectionDraft {
    /// Every required field must be non-empty after trimming.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("materialName", self.material_name.as_str()),
            ("customerName", self.customer_name.as_str()),
            ("collectionRefNum", self.collection_ref_num.as_str()),
            ("updatedByUserId", self.updated_by_user_id.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField { field });
            }
        }
        Ok(())
    }

    /// The aggregate submitted at check-in: status `CHECKED_IN`, stamped with
    /// the dispatch time, history opened with the check-in entry.
    #[must_use]
    pub fn into_new_collection(self, timestamp_iso: &str) -> NewCollection {
        let entry = StatusEntry {
            status: CollectionStatus::CheckedIn,
            timestamp: timestamp_iso.to_owned(),
            updated_by_user_id: self.updated_by_user_id,
            comments: Vec::new(),
        };
        NewCollection {
            material_name: self.material_name,
            customer_name: self.customer_name,
            collection_ref_num: self.collection_ref_num,
            lorry_reg_num: self
                .lorry_reg_num
                .filter(|reg| !reg.trim().is_empty()),
            current_status: CollectionStatus::CheckedIn,
            checked_in_at: Some(timestamp_iso.to_owned()),
            started_loading_at: None,
            finished_loading_at: None,
            checked_out_at: None,
            status_history: vec![entry],
        }
    }
}

/// [`Collection`] minus the server-assigned id; the create payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollection {
    pub material_name: String,
    pub customer_name: String,
    pub collection_ref_num: String,
    pub lorry_reg_num: Option<String>,
    pub current_status: CollectionStatus,
    pub checked_in_at: Option<String>,
    pub started_loading_at: Option<String>,
    pub finished_loading_at: Option<String>,
    pub checked_out_at: Option<String>,
    pub status_history: Vec<StatusEntry>,
}

// --- The store ---

/// Everything the shell renders from: the collection store, the per-class
/// request bookkeeping, and the tick clock the shell drives.
///
/// The store is exclusively mutated by the app's `update` in response to
/// completed operations; no other component writes to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Model {
    pub collections: Vec<Collection>,
    pub requests: Requests,
    /// Epoch milliseconds of the shell's most recent tick. All stamped
    /// timestamps and live-timer computations derive from this, never from
    /// the wall clock.
    pub last_tick_ms: i64,
    pub rewind_policy: RewindPolicy,
}

impl Model {
    #[must_use]
    pub fn collection(&self, id: &CollectionId) -> Option<&Collection> {
        self.collections.iter().find(|c| &c.id == id)
    }

    /// By-id lookup + full replacement, never a field-by-field patch, so a
    /// stale partial update cannot leave the store mixed. Unknown ids leave
    /// the store unchanged.
    pub fn replace_collection(&mut self, updated: Collection) -> bool {
        match self.collections.iter().position(|c| c.id == updated.id) {
            Some(index) => {
                self.collections[index] = updated;
                true
            }
            None => false,
        }
    }

    pub fn remove_collection(&mut self, id: &CollectionId) -> bool {
        let before = self.collections.len();
        self.collections.retain(|c| &c.id != id);
        self.collections.len() != before
    }

    /// ISO-8601 of the last tick; what every dispatch stamps.
    #[must_use]
    pub fn now_iso(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.last_tick_ms)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH)
            .to_rfc3339()
    }
}

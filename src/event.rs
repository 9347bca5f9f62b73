use serde::{Deserialize, Serialize};

use crate::model::{Collection, CollectionDraft, CollectionId, UserId};
use crate::request::{CommentTarget, OperationClass};
use crate::status::CollectionStatus;

/// What the transport capability hands back for a request expecting a `T`
/// body.
pub type TransportResult<T> = crux_http::Result<crux_http::Response<T>>;

/// Everything that can happen to the core. Shell-driven events are
/// serializable across the FFI boundary; transport completions are
/// core-internal and skipped.
#[derive(Serialize, Deserialize, Debug)]
pub enum Event {
    // --- shell-driven ---
    /// Load the full collection store.
    FetchCollections,
    /// Check a new collection in. Drafts that fail validation are rejected
    /// before any transport call.
    CreateCollection(Box<CollectionDraft>),
    /// Move a collection to its single legal next checkpoint, optionally
    /// attaching a comment to the new history entry.
    AdvanceStatus {
        collection_id: CollectionId,
        user_id: UserId,
        comment: Option<String>,
    },
    /// Operator correction within one step of the current checkpoint.
    EditStatus {
        collection_id: CollectionId,
        user_id: UserId,
        new_status: CollectionStatus,
    },
    /// Append a comment to one specific history entry, identified by status
    /// AND entry timestamp.
    AddComment {
        collection_id: CollectionId,
        status: CollectionStatus,
        status_timestamp: String,
        user_id: UserId,
        text: String,
    },
    DeleteCollection {
        collection_id: CollectionId,
    },
    /// The shell's ~1 Hz clock; drives live timers and stamps dispatches.
    Tick {
        now_ms: i64,
    },
    /// Explicit UI-driven reset of one operation class, e.g. when a form
    /// closes or reopens.
    Reset(OperationClass),

    // --- transport completions (core-internal) ---
    #[serde(skip)]
    CollectionsFetched(Box<TransportResult<Vec<Collection>>>),
    #[serde(skip)]
    CollectionCreated(Box<TransportResult<Collection>>),
    #[serde(skip)]
    StatusSaved {
        collection_id: CollectionId,
        result: Box<TransportResult<Collection>>,
    },
    #[serde(skip)]
    CommentSaved {
        target: CommentTarget,
        result: Box<TransportResult<Collection>>,
    },
    #[serde(skip)]
    CollectionDeleted {
        collection_id: CollectionId,
        result: Box<TransportResult<Vec<u8>>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_size_is_reasonable() {
        // Completion payloads are boxed to keep the enum small.
        let size = std::mem::size_of::<Event>();
        assert!(
            size <= 128,
            "Event enum is {size} bytes - box more variants"
        );
    }

    #[test]
    fn shell_events_round_trip_through_serde() {
        let event = Event::AddComment {
            collection_id: CollectionId::new("col-1"),
            status: CollectionStatus::Loading,
            status_timestamp: "2024-05-01T08:30:00+00:00".into(),
            user_id: UserId::new("op-7"),
            text: "bay 4".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        match back {
            Event::AddComment { status, text, .. } => {
                assert_eq!(status, CollectionStatus::Loading);
                assert_eq!(text, "bay 4");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

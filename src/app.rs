//! The lifecycle orchestrator: validates requested changes against the
//! status model, dispatches them through the HTTP capability, and folds
//! completed operations back into the collection store. All store writes
//! happen here, on event completion, within the shell's event loop.

use crux_core::render::Render;
use crux_http::Http;
use serde::{Deserialize, Serialize};

use crate::duration::{self, ElapsedDisplay, UrgencyColor};
use crate::event::{Event, TransportResult};
use crate::model::{
    Collection, CollectionDraft, CollectionId, Comment, CommentId, Model, UserId,
};
use crate::request::{CommentTarget, RequestState};
use crate::status::CollectionStatus;

/// The shell resolves requests against this origin.
pub const API_BASE_URL: &str = "https://yard.gatewatch.example";
const COLLECTIONS_PATH: &str = "/api/collections";

pub const CREATED_MESSAGE: &str = "Collection added successfully!";

fn collections_url() -> String {
    format!("{API_BASE_URL}{COLLECTIONS_PATH}")
}

fn collection_url(id: &CollectionId) -> String {
    format!("{API_BASE_URL}{COLLECTIONS_PATH}/{id}")
}

#[derive(Default)]
pub struct App;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        match event {
            Event::FetchCollections => {
                model.requests.fetch_all.start();
                caps.http
                    .get(collections_url())
                    .expect_json::<Vec<Collection>>()
                    .send(|result| Event::CollectionsFetched(Box::new(result)));
            }

            Event::CollectionsFetched(result) => match Self::take_success(*result) {
                Ok(collections) => {
                    model.collections = collections;
                    model.requests.fetch_all.succeed();
                }
                Err(message) => {
                    tracing::warn!(%message, "failed to load collections");
                    model.requests.fetch_all.fail(message);
                }
            },

            Event::CreateCollection(draft) => Self::create_collection(*draft, model, caps),

            Event::CollectionCreated(result) => match Self::take_success(*result) {
                Ok(collection) => {
                    model.collections.push(collection);
                    model.requests.create.succeed();
                    model.requests.create_success = Some(CREATED_MESSAGE.to_string());
                }
                Err(message) => {
                    tracing::warn!(%message, "failed to add collection");
                    model.requests.create.fail(message);
                }
            },

            Event::AdvanceStatus {
                collection_id,
                user_id,
                comment,
            } => Self::advance_status(collection_id, user_id, comment, model, caps),

            Event::EditStatus {
                collection_id,
                user_id,
                new_status,
            } => Self::edit_status(collection_id, user_id, new_status, model, caps),

            Event::StatusSaved {
                collection_id,
                result,
            } => Self::fold_status_result(collection_id, *result, model),

            Event::AddComment {
                collection_id,
                status,
                status_timestamp,
                user_id,
                text,
            } => Self::add_comment(collection_id, status, status_timestamp, user_id, text, model, caps),

            Event::CommentSaved { target, result } => match Self::take_success(*result) {
                Ok(updated) => {
                    // the store update applies even when the tracked target
                    // has moved on; only the feedback is scoped
                    model.replace_collection(updated);
                    model.requests.add_comment.succeed(&target);
                }
                Err(message) => {
                    tracing::warn!(%message, "failed to add comment");
                    model.requests.add_comment.fail(&target, message);
                }
            },

            Event::DeleteCollection { collection_id } => {
                model.requests.delete.start();
                let id = collection_id.clone();
                caps.http
                    .delete(collection_url(&collection_id))
                    .send(move |result| Event::CollectionDeleted {
                        collection_id: id,
                        result: Box::new(result),
                    });
            }

            Event::CollectionDeleted {
                collection_id,
                result,
            } => match *result {
                Ok(response) if response.status().is_success() => {
                    model.remove_collection(&collection_id);
                    model.requests.delete.succeed();
                }
                Ok(response) => {
                    model
                        .requests
                        .delete
                        .fail(format!("Server error ({})", response.status()));
                }
                Err(error) => model.requests.delete.fail(error.to_string()),
            },

            Event::Tick { now_ms } => model.last_tick_ms = now_ms,

            Event::Reset(class) => model.requests.reset(class),
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        let now_ms = model.last_tick_ms;
        let rows = model
            .collections
            .iter()
            .map(|collection| CollectionRow {
                id: collection.id.clone(),
                material_name: collection.material_name.clone(),
                customer_name: collection.customer_name.clone(),
                collection_ref_num: collection.collection_ref_num.clone(),
                lorry_reg_num: collection.lorry_reg_num.clone(),
                current_status: collection.current_status,
                status_label: collection.current_status.display_name().to_string(),
                time_in_status: duration::time_spent_in_current_status(collection, now_ms),
                urgency: duration::status_urgency(collection, now_ms),
                since_check_in: collection.checked_in_at.as_deref().map_or_else(
                    ElapsedDisplay::fallback,
                    |iso| duration::elapsed_since(iso, now_ms),
                ),
                live_timer: !collection.current_status.is_terminal(),
            })
            .collect();

        ViewModel {
            rows,
            fetch_all: model.requests.fetch_all.clone(),
            create: model.requests.create.clone(),
            create_success: model.requests.create_success.clone(),
            update_status: model.requests.update_status.clone(),
            delete: model.requests.delete.clone(),
            add_comment: model.requests.add_comment.state().clone(),
            comment_target: model.requests.add_comment.target().cloned(),
        }
    }
}

impl App {
    /// Unwraps a transport completion into the decoded body, flattening
    /// transport errors and non-success statuses into one human-readable
    /// message.
    fn take_success<T>(result: TransportResult<T>) -> Result<T, String> {
        match result {
            Ok(mut response) if response.status().is_success() => response
                .take_body()
                .ok_or_else(|| "Server returned an empty response".to_string()),
            Ok(response) => Err(format!("Server error ({})", response.status())),
            Err(error) => Err(error.to_string()),
        }
    }

    fn is_not_found(error: &crux_http::HttpError) -> bool {
        matches!(error, crux_http::HttpError::Http { code, .. } if *code as u16 == 404)
    }

    fn create_collection(draft: CollectionDraft, model: &mut Model, caps: &Capabilities) {
        if let Err(error) = draft.validate() {
            // resolved locally; the coordinator never sees a failed state
            tracing::warn!(%error, "collection draft rejected before dispatch");
            return;
        }
        model.requests.create.start();
        model.requests.create_success = None;
        let payload = draft.into_new_collection(&model.now_iso());
        match serde_json::to_vec(&payload) {
            Ok(bytes) => {
                caps.http
                    .post(collections_url())
                    .header("content-type", "application/json")
                    .body(bytes)
                    .expect_json::<Collection>()
                    .send(|result| Event::CollectionCreated(Box::new(result)));
            }
            Err(error) => {
                tracing::error!(%error, "failed to encode create payload");
                model.requests.create.fail("Failed to encode collection");
            }
        }
    }

    fn advance_status(
        collection_id: CollectionId,
        user_id: UserId,
        comment: Option<String>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let Some(collection) = model.collection(&collection_id) else {
            tracing::warn!(%collection_id, "status advance for unknown collection");
            return;
        };
        let next = match collection.current_status.advance() {
            Ok(next) => next,
            Err(error) => {
                tracing::warn!(%error, %collection_id, "status advance rejected");
                return;
            }
        };
        let mut updated = collection.clone();
        updated.apply_status_change(
            next,
            &model.now_iso(),
            &user_id,
            comment.as_deref(),
            model.rewind_policy,
        );
        Self::submit_status_update(updated, model, caps);
    }

    fn edit_status(
        collection_id: CollectionId,
        user_id: UserId,
        new_status: CollectionStatus,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let Some(collection) = model.collection(&collection_id) else {
            tracing::warn!(%collection_id, "status edit for unknown collection");
            return;
        };
        if let Err(error) = collection.current_status.validate_edit(new_status) {
            tracing::warn!(%error, %collection_id, "status edit rejected");
            return;
        }
        let mut updated = collection.clone();
        updated.apply_status_change(
            new_status,
            &model.now_iso(),
            &user_id,
            None,
            model.rewind_policy,
        );
        Self::submit_status_update(updated, model, caps);
    }

    fn submit_status_update(updated: Collection, model: &mut Model, caps: &Capabilities) {
        model.requests.update_status.start();
        let collection_id = updated.id.clone();
        match serde_json::to_vec(&updated) {
            Ok(bytes) => {
                caps.http
                    .put(collection_url(&collection_id))
                    .header("content-type", "application/json")
                    .body(bytes)
                    .expect_json::<Collection>()
                    .send(move |result| Event::StatusSaved {
                        collection_id,
                        result: Box::new(result),
                    });
            }
            Err(error) => {
                tracing::error!(%error, "failed to encode status payload");
                model
                    .requests
                    .update_status
                    .fail("Failed to encode status update");
            }
        }
    }

    fn fold_status_result(
        collection_id: CollectionId,
        result: TransportResult<Collection>,
        model: &mut Model,
    ) {
        match result {
            Ok(mut response) if response.status().is_success() => {
                match response.take_body() {
                    Some(updated) => {
                        model.replace_collection(updated);
                        model.requests.update_status.succeed();
                    }
                    None => model
                        .requests
                        .update_status
                        .fail("Server returned an empty response"),
                }
            }
            // the collection vanished server-side: already deleted, not an
            // error the operator can act on
            Ok(response) if response.status() as u16 == 404 => {
                tracing::info!(%collection_id, "collection gone server-side; dropping it");
                model.remove_collection(&collection_id);
                model.requests.update_status.succeed();
            }
            Ok(response) => model
                .requests
                .update_status
                .fail(format!("Server error ({})", response.status())),
            Err(error) if Self::is_not_found(&error) => {
                tracing::info!(%collection_id, "collection gone server-side; dropping it");
                model.remove_collection(&collection_id);
                model.requests.update_status.succeed();
            }
            Err(error) => model.requests.update_status.fail(error.to_string()),
        }
    }

    fn add_comment(
        collection_id: CollectionId,
        status: CollectionStatus,
        status_timestamp: String,
        user_id: UserId,
        text: String,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            // resolved locally, no network round-trip
            tracing::warn!(%collection_id, "blank comment rejected before dispatch");
            return;
        }
        let Some(collection) = model.collection(&collection_id) else {
            tracing::warn!(%collection_id, "comment for unknown collection");
            return;
        };
        let mut updated = collection.clone();
        let timestamp = model.now_iso();
        let Some(entry) = updated.status_entry_mut(status, &status_timestamp) else {
            tracing::warn!(%collection_id, %status, "comment targets an unknown status entry");
            return;
        };
        entry.comments.push(Comment {
            id: CommentId::generate(),
            user_id,
            text: trimmed.to_owned(),
            timestamp,
        });

        let target = CommentTarget {
            collection_id,
            status,
            status_timestamp,
        };
        model.requests.add_comment.start(target.clone());

        match serde_json::to_vec(&updated) {
            Ok(bytes) => {
                caps.http
                    .put(collection_url(&target.collection_id))
                    .header("content-type", "application/json")
                    .body(bytes)
                    .expect_json::<Collection>()
                    .send(move |result| Event::CommentSaved {
                        target,
                        result: Box::new(result),
                    });
            }
            Err(error) => {
                tracing::error!(%error, "failed to encode comment payload");
                model
                    .requests
                    .add_comment
                    .fail(&target, "Failed to encode comment");
            }
        }
    }
}

// --- View model ---

/// One dashboard row. `time_in_status` and `urgency` are recomputed from the
/// tick clock on every view; rows whose status is terminal need no live
/// timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRow {
    pub id: CollectionId,
    pub material_name: String,
    pub customer_name: String,
    pub collection_ref_num: String,
    pub lorry_reg_num: Option<String>,
    pub current_status: CollectionStatus,
    pub status_label: String,
    pub time_in_status: String,
    pub urgency: UrgencyColor,
    pub since_check_in: ElapsedDisplay,
    pub live_timer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub rows: Vec<CollectionRow>,
    pub fetch_all: RequestState,
    pub create: RequestState,
    pub create_success: Option<String>,
    pub update_status: RequestState,
    pub delete: RequestState,
    pub add_comment: RequestState,
    pub comment_target: Option<CommentTarget>,
}

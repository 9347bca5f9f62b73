//! Headless site-operations core for a materials yard: tracks lorry
//! collections through the fixed checkpoint workflow (checked-in → loading →
//! loaded → checked-out), keeps per-operation request bookkeeping so UI
//! feedback never leaks onto the wrong control, and computes live
//! time-in-checkpoint displays with urgency colours.
//!
//! The core is a Crux app: the shell renders the [`ViewModel`], dispatches
//! [`Event`]s, executes HTTP effects, and drives a ~1 Hz [`Event::Tick`]
//! clock. No wall-clock reads, no transport, no rendering live here.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod duration;
pub mod event;
pub mod model;
pub mod request;
pub mod status;

pub use app::{App, Capabilities, CollectionRow, Effect, ViewModel, API_BASE_URL, CREATED_MESSAGE};
pub use duration::{ElapsedDisplay, UrgencyColor, FALLBACK_DISPLAY};
pub use event::Event;
pub use model::{
    Collection, CollectionDraft, CollectionId, Comment, CommentId, Model, NewCollection,
    RewindPolicy, StatusEntry, UserId, ValidationError,
};
pub use request::{
    CommentRequests, CommentTarget, OperationClass, RequestPhase, RequestState, Requests,
};
pub use status::{CollectionStatus, TimestampField, TransitionError, STATUS_FLOW};

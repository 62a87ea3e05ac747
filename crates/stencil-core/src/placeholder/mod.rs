//! Placeholder subsystem: user-fillable slots on top of factory-built nodes.
//!
//! Per-node lifecycle:
//! `Inactive -> Activated -> Editing (text only) -> Replaced`, with
//! `Deactivated` reachable from `Activated` and `Editing`. A slot holding
//! user content rests in `Replaced`; content replacement lands there
//! directly and, for media slots, swaps the node while keeping the slot
//! identity.

mod events;
mod manager;
mod state;
mod suggestions;

pub use events::{EventBus, PlaceholderEvent};
pub use manager::{PlaceholderManager, PlaceholderSnapshot, ReplaceRequest};
pub use state::{PlaceholderPhase, PlaceholderState};
pub use suggestions::{StaticSuggestions, SuggestionProvider};

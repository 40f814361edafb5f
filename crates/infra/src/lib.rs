//! `foodlabel-infra` — persistence adapters.
//!
//! - `credentials`: credential store backends beyond the in-memory one that
//!   ships with `foodlabel-auth` (Postgres behind the `postgres` feature).
//! - `labels`: the food-label catalog collaborator (paged listing, soft
//!   delete, category lookup).

pub mod credentials;
pub mod labels;

pub use labels::{
    FoodLabel, InMemoryLabelStore, LabelDraft, LabelPage, LabelQuery, LabelStore, Translation,
};

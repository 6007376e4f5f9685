//! # nms-models: shared NMS model migrations
//!
//! Every schema change to the shared NMS tables lives here as a
//! [`Migration`](nms_orm::Migration). [`migrations::manager`] returns them
//! registered and ordered for the runner.

pub mod migrations;

pub use migrations::{all, manager};

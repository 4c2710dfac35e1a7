//! Terminal host for the wizard, the entry store and the message API.

pub mod add;
pub mod api;
pub mod entries;
pub mod import;
pub mod prompt;
pub mod resolve;
pub mod search;
pub mod setup;
pub mod show;
pub mod ui;

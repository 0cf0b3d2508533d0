//! billmail library
//!
//! Template-driven billing notification core: token substitution,
//! template storage, duplicate suppression and webhook audit logging.
//! Exposed as a library so host applications embed the dispatcher
//! directly; transport and UI live outside this crate.

pub mod app;
pub mod config;
pub mod database;
pub mod dedup;
pub mod delivery;
pub mod error;
pub mod render;
pub mod services;
pub mod taxonomy;

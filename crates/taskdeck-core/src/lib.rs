//! Core taskdeck library (API adapter, session and task stores, config).

pub mod api;
pub mod config;
pub mod context;
pub mod guard;
pub mod models;
pub mod notice;
pub mod session;
pub mod tasks;
pub mod validation;

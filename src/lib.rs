//! LINE Agent: LINE webhook and scheduled push bot backed by Google Sheets.

pub mod config;
pub mod content;
pub mod error;
pub mod providers;
pub mod push;
pub mod routes;
pub mod schedule;
pub mod service;
pub mod webhook;

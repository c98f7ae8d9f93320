//! HTTP request handlers for the alerts API.

pub mod alerts;
pub mod draw;
pub mod health;

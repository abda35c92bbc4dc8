//! Test-only helpers: data factories, in-memory repo mocks and an AppState
//! builder for HTTP-level tests.

pub mod app_state_builder;
pub mod factories;
pub mod mocks;

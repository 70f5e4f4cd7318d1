// =============================================================================
// Signal Scout: technical-indicator screening engine
// =============================================================================
//
// Pure engine (no I/O):
//   market_data  -> indicators -> signals -> recommendation
//
// Plumbing around it:
//   provider (Yahoo, ticker universe), scanner (scan loop), runtime_config,
//   app_state (scan cache), api (axum), render (text / HTML).
// =============================================================================

pub mod api;
pub mod app_state;
pub mod errors;
pub mod indicators;
pub mod market_data;
pub mod provider;
pub mod recommendation;
pub mod render;
pub mod runtime_config;
pub mod scanner;
pub mod signals;
pub mod types;

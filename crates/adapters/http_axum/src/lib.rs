//! # castkeep-adapter-http-axum
//!
//! HTTP adapter using axum — the query surface for per-device runtime
//! state and the mutation entry points for global settings.
//!
//! ## Responsibilities
//! - `GET /health` — liveness probe
//! - `GET /api/devices` — diagnostic snapshot of every device
//! - `GET /api/devices/{name}` — one device's snapshot
//! - `GET /api/settings` / `PUT /api/settings` — read and mutate the cast
//!   interval and global gate at runtime, without a restart
//!
//! ## Dependency rule
//! Depends on `castkeep-app` (controller, settings) and `castkeep-domain`.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

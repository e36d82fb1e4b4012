//! # castkeep-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `CastTransport` — cast, stop, volume, and status commands to a device
//!   - `StateStore` — key-value reads of external entity states
//!   - `StateChangePublisher` — push entity state changes into the system
//! - Provide the scheduling & decision engine:
//!   - `DashboardResolver` — which dashboard (if any) should show right now
//!   - `DeviceProbe` — classify what a device is currently showing
//!   - `CastController` — per-device state machine deciding cast/skip/re-cast
//!   - `Scheduler` — drive all devices on a fixed interval, apply events
//! - Provide **in-process infrastructure** (state-change bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `castkeep-domain` only (plus `tokio::sync`/`tokio::time` for
//! channels and timers). Never imports adapter crates. Adapters depend on
//! *this* crate, not the reverse.

pub mod controller;
pub mod diagnostics;
pub mod event_bus;
pub mod ports;
pub mod probe;
pub mod resolver;
pub mod scheduler;
pub mod settings;

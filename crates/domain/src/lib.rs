//! # castkeep-domain
//!
//! Pure domain model for the castkeep dashboard-casting scheduler.
//!
//! ## Responsibilities
//! - Foundational types: timestamps, time-of-day windows, event identifiers
//! - Define **Devices** (cast targets with an ordered list of dashboard windows)
//! - Define **Gates** (entity-state conditions that enable/disable casting)
//! - Define **Triggers** (entity transitions that override window resolution)
//! - Define **Playback classification** of raw device status output
//! - Define **Decisions** (the resolver's output: cast this, or do nothing)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod decision;
pub mod device;
pub mod event;
pub mod gate;
pub mod status;
pub mod trigger;

//! Pure module stat logic for the upgrade calculator.
//!
//! This crate contains all calculator logic that is independent of any
//! front-end. Functions take plain data and return results, making them
//! unit-testable and usable from the CLI, the simtest harness, or any
//! future UI.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Form limits and stat formula coefficients |
//! | [`form`] | Form state, user actions, and the pure reducer |
//! | [`modules`] | Module kinds, tiered entries, application modes |
//! | [`report`] | Display rows and per-kind module summary |
//! | [`stats`] | Tier-1 normalization and the four stat formulas |
//!
//! Tier scaling is linear: a tier-`t` module counts as `t` tier-1 modules.

pub mod constants;
pub mod form;
pub mod modules;
pub mod report;
pub mod stats;

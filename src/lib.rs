// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Pet Value Admin Guard
//!
//! Admin-facing login verification for the pet value catalog, guarded by an
//! in-process rate limiter:
//!
//! - Fixed-window attempt counting per client identifier
//! - One admitted login attempt per client every two minutes (default)
//! - Periodic sweep of expired tracking records
//! - Human-readable wait messages for throttled clients
//!
//! Limits are enforced per process. Separate instances keep separate
//! counters and a restart clears them.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod sweeper;

pub use config::Config;
pub use error::{AppError, Result};
pub use limiter::{format_wait_time, RateLimitResult, RateLimiter};
pub use sweeper::{spawn_sweeper, SweepHandle};

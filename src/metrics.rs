// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for login throttling.
//!
//! Metrics are registered in a registry owned by [`Metrics`] rather than the
//! process-wide default, so each service instance (and each test) starts
//! from zero.

use crate::error::{AppError, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Login and limiter metrics.
pub struct Metrics {
    registry: Registry,
    /// Login attempts by limiter outcome (`allowed` or `limited`)
    pub login_attempts: IntCounterVec,
    /// Credential checks by result (`success` or `failure`)
    pub login_verifications: IntCounterVec,
    /// Identifiers currently tracked by the limiter
    pub tracked_identifiers: IntGauge,
    /// Records removed by the expiry sweep
    pub swept_records: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let login_attempts = IntCounterVec::new(
            Opts::new("login_attempts_total", "Login attempts by rate limit outcome"),
            &["outcome"],
        )?;
        let login_verifications = IntCounterVec::new(
            Opts::new("login_verifications_total", "Admin credential checks by result"),
            &["result"],
        )?;
        let tracked_identifiers = IntGauge::new(
            "rate_limiter_tracked_identifiers",
            "Identifiers currently tracked by the rate limiter",
        )?;
        let swept_records = IntCounter::new(
            "rate_limiter_swept_total",
            "Expired rate limit records removed by the sweep",
        )?;

        registry.register(Box::new(login_attempts.clone()))?;
        registry.register(Box::new(login_verifications.clone()))?;
        registry.register(Box::new(tracked_identifiers.clone()))?;
        registry.register(Box::new(swept_records.clone()))?;

        Ok(Self {
            registry,
            login_attempts,
            login_verifications,
            tracked_identifiers,
            swept_records,
        })
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| AppError::Internal(e.to_string()))
    }
}

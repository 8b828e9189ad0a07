// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Client address extraction for rate limiting.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Header carrying the proxy chain, client first.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Header carrying the client address set by a single proxy.
pub const REAL_IP: &str = "x-real-ip";

/// Fallback when no address information is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive a client identifier from request metadata.
///
/// Priority: first entry of `X-Forwarded-For`, then `X-Real-IP`, then the
/// connection's peer address, then `"unknown"`. Only the first forwarded
/// entry is considered; when it is blank the next source is used. All
/// clients without any address share the `"unknown"` identifier.
pub fn client_identifier(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header_value(FORWARDED_FOR)
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header_value(REAL_IP) {
        return real_ip.to_string();
    }

    remote
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

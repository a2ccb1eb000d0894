//! Request inspection.
//!
//! # Responsibilities
//! - Resolve the client IP behind a known number of reverse proxies
//!
//! # Design Decisions
//! - Only the `trust_proxy_hops` right-most `X-Forwarded-For` hops are
//!   trusted; anything further left is client-controlled
//! - Malformed forwarded entries are skipped, never fatal

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the originating client address.
///
/// The address chain is every `X-Forwarded-For` entry, left to right,
/// followed by the socket peer. With `trusted_hops = n` the client is the
/// entry `n` positions left of the peer, clamped to the left-most entry.
/// `trusted_hops = 0` ignores the header entirely.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trusted_hops: usize) -> Option<IpAddr> {
    let mut chain: Vec<IpAddr> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(parse_forwarded_entry)
        .collect();

    match peer {
        Some(addr) => chain.push(addr.ip()),
        // Without a peer there is no trusted hop to anchor on.
        None => return None,
    }

    let index = chain.len().saturating_sub(1).saturating_sub(trusted_hops);
    chain.get(index).copied()
}

fn parse_forwarded_entry(entry: &str) -> Option<IpAddr> {
    let entry = entry.trim();
    entry
        .parse::<IpAddr>()
        .ok()
        .or_else(|| entry.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

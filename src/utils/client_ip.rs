//! Client address extraction for visitor bucketing.

use axum::http::HeaderMap;
use std::net::SocketAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Returns the address identifying the visitor.
///
/// Behind a reverse proxy the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`. Otherwise, and when neither header is usable, the peer address
/// of the connection is used. Forwarding headers are ignored when not behind a
/// proxy since any client can set them.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = header_str(headers, X_FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded.or_else(|| header_str(headers, X_REAL_IP)) {
            return ip.to_string();
        }
    }

    peer.ip().to_string()
}

pub mod os;

pub use os::{classify_os, UNKNOWN_OS};

use std::net::SocketAddr;
use std::path::Path;

use axum::http::HeaderMap;

use crate::error::{AppError, Result};

/// Client IP: the socket peer, or the first `X-Forwarded-For` hop behind a trusted proxy
pub fn client_ip(peer: SocketAddr, headers: &HeaderMap, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.ip().to_string()
}

/// Read the static document served to every tracked access
pub async fn load_tracked_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    tokio::fs::read(path)
        .await
        .map_err(|e| AppError::TrackedFile(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "203.0.113.9:51234".parse().unwrap()
    }

    #[test]
    fn test_client_ip_uses_peer_by_default() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("1.2.3.4"));
        assert_eq!(client_ip(peer(), &headers, false), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_trusts_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 1.2.3.4 , 10.0.0.1"),
        );
        assert_eq!(client_ip(peer(), &headers, true), "1.2.3.4");
        assert_eq!(client_ip(peer(), &HeaderMap::new(), true), "203.0.113.9");
    }

    #[tokio::test]
    async fn test_missing_tracked_file() {
        let err = load_tracked_file("/definitely/not/here.txt").await.unwrap_err();
        assert!(matches!(err, AppError::TrackedFile(_)));
    }
}

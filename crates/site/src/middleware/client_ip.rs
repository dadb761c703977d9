//! Client IP resolution behind proxies.
//!
//! Proxy headers are only believed when the socket peer is a trusted proxy
//! (`SITE_TRUSTED_PROXIES`). Any other peer is the client itself, whatever
//! headers it sends.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{Extensions, HeaderMap};
use faqbase_core::network::IpFilter;

/// Proxy headers checked in order. `x-forwarded-for` uses its first entry.
const IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-forwarded-for", "x-real-ip", "fly-client-ip"];

/// Peers allowed to report the client address through proxy headers.
///
/// Installed as a request extension by the site router. Without it no
/// peer is trusted.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<IpFilter>);

impl TrustedProxies {
    #[must_use]
    pub fn new(filter: IpFilter) -> Self {
        Self(Arc::new(filter))
    }

    #[must_use]
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.0.contains(ip)
    }
}

/// Client IP from proxy headers, if any header carries a valid address.
#[must_use]
pub fn ip_from_headers(headers: &HeaderMap) -> Option<IpAddr> {
    IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

/// Client IP for a request.
///
/// The socket peer address, unless the peer is a trusted proxy, in which
/// case the proxy headers win. `None` when the peer is unknown.
#[must_use]
pub fn resolve(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())?;
    let trusted = extensions
        .get::<TrustedProxies>()
        .is_some_and(|proxies| proxies.contains(peer));
    if trusted {
        Some(ip_from_headers(headers).unwrap_or(peer))
    } else {
        Some(peer)
    }
}

/// Like [`resolve`], with `0.0.0.0` when nothing is known.
#[must_use]
pub fn resolve_or_unspecified(headers: &HeaderMap, extensions: &Extensions) -> IpAddr {
    resolve(headers, extensions).unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn extensions(peer: &str, trusted: &str) -> Extensions {
        let mut ext = Extensions::new();
        ext.insert(ConnectInfo(SocketAddr::new(peer.parse().unwrap(), 50000)));
        ext.insert(TrustedProxies::new(IpFilter::parse(trusted).0));
        ext
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let h = headers(&[
            ("x-forwarded-for", "198.51.100.1"),
            ("cf-connecting-ip", "203.0.113.9"),
        ]);
        assert_eq!(ip_from_headers(&h), Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_for_uses_first_hop() {
        let h = headers(&[("x-forwarded-for", "2001:db8::1, 10.0.0.1")]);
        assert_eq!(ip_from_headers(&h), Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_garbage_headers_are_skipped() {
        let h = headers(&[("x-forwarded-for", "unknown"), ("x-real-ip", "192.0.2.4")]);
        assert_eq!(ip_from_headers(&h), Some("192.0.2.4".parse().unwrap()));
    }

    #[test]
    fn test_trusted_proxy_headers_are_used() {
        let h = headers(&[("x-forwarded-for", "198.51.100.7")]);
        let ext = extensions("10.0.0.2", "10.0.0.0/8");
        assert_eq!(resolve(&h, &ext), Some("198.51.100.7".parse().unwrap()));

        // A trusted proxy that sends no header is the client.
        assert_eq!(
            resolve(&HeaderMap::new(), &ext),
            Some("10.0.0.2".parse().unwrap())
        );
    }

    #[test]
    fn test_untrusted_peer_headers_are_ignored() {
        let h = headers(&[
            ("x-forwarded-for", "198.51.100.7"),
            ("cf-connecting-ip", "198.51.100.8"),
        ]);
        let ext = extensions("192.0.2.77", "10.0.0.0/8");
        assert_eq!(resolve(&h, &ext), Some("192.0.2.77".parse().unwrap()));

        let ext = extensions("192.0.2.77", "");
        assert_eq!(resolve(&h, &ext), Some("192.0.2.77".parse().unwrap()));
    }

    #[test]
    fn test_missing_trusted_list_trusts_no_one() {
        let h = headers(&[("x-forwarded-for", "198.51.100.7")]);
        let mut ext = Extensions::new();
        ext.insert(ConnectInfo("10.0.0.2:50000".parse::<SocketAddr>().unwrap()));
        assert_eq!(resolve(&h, &ext), Some("10.0.0.2".parse().unwrap()));
    }

    #[test]
    fn test_unknown_peer() {
        let h = headers(&[("x-forwarded-for", "198.51.100.7")]);
        assert_eq!(resolve(&h, &Extensions::new()), None);
        assert_eq!(
            resolve_or_unspecified(&h, &Extensions::new()),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }
}

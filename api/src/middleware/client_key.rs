//! Client key resolution for rate limiting
//!
//! The peer address is the key unless the peer is a configured trusted
//! proxy, in which case the forwarded-for chain is walked from the right
//! and the first untrusted hop is used. Headers from untrusted peers are
//! ignored so clients cannot pick their own bucket.

use std::net::IpAddr;

use actix_web::{dev::ServiceRequest, http::header::HeaderMap};
use ipnetwork::IpNetwork;

use shelf_core::domain::ClientKey;
use shelf_shared::{ConfigError, RateLimitConfig};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

#[derive(Debug, Clone, Default)]
pub struct ClientKeyResolver {
    trusted_proxies: Vec<IpNetwork>,
}

impl ClientKeyResolver {
    pub fn new(trusted_proxies: Vec<IpNetwork>) -> Self {
        Self { trusted_proxies }
    }

    /// Parse `rate_limit.trusted_proxies`; accepts single addresses and CIDR ranges
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, ConfigError> {
        let trusted_proxies = config
            .trusted_proxies
            .iter()
            .map(|entry| {
                entry
                    .trim()
                    .parse::<IpNetwork>()
                    .map_err(|e| ConfigError::Invalid {
                        field: "rate_limit.trusted_proxies",
                        reason: format!("{}: {}", entry, e),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(trusted_proxies))
    }

    pub fn is_trusted(&self, ip: IpAddr) -> bool {
        self.trusted_proxies.iter().any(|network| network.contains(ip))
    }

    pub fn resolve(&self, req: &ServiceRequest) -> ClientKey {
        let peer = req.peer_addr().map(|addr| addr.ip());
        self.resolve_parts(peer, req.headers())
    }

    pub fn resolve_parts(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> ClientKey {
        let Some(peer) = peer else {
            return ClientKey::unknown();
        };

        if !self.is_trusted(peer) {
            return ClientKey::from(peer);
        }

        self.forwarded_client(headers)
            .or_else(|| real_ip(headers))
            .map(ClientKey::from)
            .unwrap_or_else(|| ClientKey::from(peer))
    }

    /// Right-most untrusted hop, or the left-most hop when every hop is trusted
    fn forwarded_client(&self, headers: &HeaderMap) -> Option<IpAddr> {
        let hops: Vec<IpAddr> = headers
            .get_all(X_FORWARDED_FOR)
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
            .collect();

        hops.iter()
            .rev()
            .find(|hop| !self.is_trusted(**hop))
            .or_else(|| hops.first())
            .copied()
    }
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(X_REAL_IP)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_static(*name),
                HeaderValue::from_static(*value),
            );
        }
        map
    }

    fn resolver(proxies: &[&str]) -> ClientKeyResolver {
        let mut config = RateLimitConfig::default();
        for proxy in proxies {
            config = config.with_trusted_proxy(*proxy);
        }
        ClientKeyResolver::from_config(&config).unwrap()
    }

    #[test]
    fn test_untrusted_peer_headers_are_ignored() {
        let resolver = resolver(&[]);
        let key = resolver.resolve_parts(
            Some("198.51.100.4".parse().unwrap()),
            &headers(&[("x-forwarded-for", "1.2.3.4"), ("x-real-ip", "5.6.7.8")]),
        );
        assert_eq!(key.as_str(), "198.51.100.4");
    }

    #[test]
    fn test_trusted_proxy_uses_rightmost_untrusted_hop() {
        let resolver = resolver(&["10.0.0.0/8"]);
        let key = resolver.resolve_parts(
            Some("10.0.0.2".parse().unwrap()),
            &headers(&[("x-forwarded-for", "6.6.6.6, 203.0.113.9, 10.0.0.7")]),
        );
        assert_eq!(key.as_str(), "203.0.113.9");
    }

    #[test]
    fn test_trusted_proxy_falls_back_to_real_ip_then_peer() {
        let resolver = resolver(&["10.0.0.2"]);
        let peer = Some("10.0.0.2".parse().unwrap());

        let key = resolver.resolve_parts(peer, &headers(&[("x-real-ip", "203.0.113.5")]));
        assert_eq!(key.as_str(), "203.0.113.5");

        let key = resolver.resolve_parts(peer, &headers(&[("x-forwarded-for", "garbage")]));
        assert_eq!(key.as_str(), "10.0.0.2");
    }

    #[test]
    fn test_missing_peer_is_unknown() {
        let key = resolver(&[]).resolve_parts(None, &HeaderMap::new());
        assert_eq!(key, ClientKey::unknown());
    }

    #[test]
    fn test_invalid_trusted_proxy_is_rejected() {
        let config = RateLimitConfig::default().with_trusted_proxy("not-an-address");
        let err = ClientKeyResolver::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "rate_limit.trusted_proxies",
                ..
            }
        ));
    }
}

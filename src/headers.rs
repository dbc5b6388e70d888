//! Request-header mapping for HTTP middleware.
//!
//! Picks the client address the way a reverse proxy reports it and turns the
//! lookup result into two `(name, value)` header pairs. No HTTP framework is
//! involved; callers copy the pairs onto their own request type.

use crate::{CachedLocator, Result, common::Location};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Header carrying the client address set by the front proxy.
pub const REAL_IP_HEADER: &str = "X-Real-IP";
/// Value written to both headers when the lookup fails.
pub const NOT_FOUND_PLACEHOLDER: &str = "NotFound";

/// Names of the headers receiving the city and ISP.
///
/// 写入城市与运营商的请求头名称。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderNames {
    #[serde(alias = "country")]
    pub city: String,
    #[serde(alias = "region")]
    pub isp: String,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            city: "X-QQWry-City".to_string(),
            isp: "X-QQWry-ISP".to_string(),
        }
    }
}

/// Client address from the `X-Real-IP` value, falling back to the peer
/// address with its port stripped.
///
/// 优先使用 `X-Real-IP`，否则使用去掉端口的对端地址。
pub fn client_ip(real_ip: Option<&str>, remote_addr: &str) -> String {
    match real_ip {
        Some(ip) if !ip.is_empty() => ip.to_string(),
        _ => match remote_addr.parse::<SocketAddr>() {
            Ok(addr) => addr.ip().to_string(),
            Err(_) => remote_addr.to_string(),
        },
    }
}

impl CachedLocator {
    /// Look up the client of a request and build its two header pairs.
    ///
    /// A failed lookup of any kind fills both values with
    /// [`NOT_FOUND_PLACEHOLDER`].
    ///
    /// 查询请求客户端地址并生成两个请求头；失败时填入 `NotFound`。
    pub fn header_values(
        &self,
        real_ip: Option<&str>,
        remote_addr: &str,
    ) -> [(String, String); 2] {
        let ip = client_ip(real_ip, remote_addr);
        let names = self.headers();
        let (city, isp) = placeholder_on_error(self.query(&ip), &ip);
        [(names.city.clone(), city), (names.isp.clone(), isp)]
    }
}

fn placeholder_on_error(result: Result<Location>, ip: &str) -> (String, String) {
    match result {
        Ok(location) => (location.city, location.isp),
        Err(e) => {
            log::debug!("no location for {ip}: {e}");
            (
                NOT_FOUND_PLACEHOLDER.to_string(),
                NOT_FOUND_PLACEHOLDER.to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabaseStore, Locator, LocatorConfig};
    use std::{net::Ipv4Addr, sync::Arc};

    /// Single range from 1.1.1.0: city "Sydney", ISP "Telstra".
    fn sydney_db() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&u32::from(Ipv4Addr::new(1, 1, 1, 0)).to_le_bytes());
        data.extend_from_slice(&[15, 0, 0]);
        data.extend_from_slice(&[0xFF; 4]);
        data.extend_from_slice(b"Sydney\0Telstra\0");
        data
    }

    fn cached() -> CachedLocator {
        CachedLocator::new(Locator::from_bytes(sydney_db()))
    }

    #[test]
    fn client_ip_prefers_real_ip_header() {
        assert_eq!(client_ip(Some("1.1.1.7"), "10.0.0.1:5555"), "1.1.1.7");
        assert_eq!(client_ip(Some(""), "1.1.1.1:9999"), "1.1.1.1");
        assert_eq!(client_ip(None, "1.1.1.1:9999"), "1.1.1.1");
        assert_eq!(client_ip(None, "[2001:db8::1]:443"), "2001:db8::1");
        assert_eq!(client_ip(None, "1.1.1.1"), "1.1.1.1");
    }

    #[test]
    fn header_values_from_remote_addr() {
        let values = cached().header_values(None, "1.1.1.1:9999");
        assert_eq!(
            values,
            [
                ("X-QQWry-City".to_string(), "Sydney".to_string()),
                ("X-QQWry-ISP".to_string(), "Telstra".to_string()),
            ]
        );
    }

    #[test]
    fn header_values_use_placeholder_on_failure() {
        let cached = cached();
        for (real_ip, remote) in [
            (None, "0.0.0.1:80"),
            (Some("not-an-ip"), "1.1.1.1:80"),
            (None, "[::1]:80"),
        ] {
            let [(_, city), (_, isp)] = cached.header_values(real_ip, remote);
            assert_eq!(city, NOT_FOUND_PLACEHOLDER);
            assert_eq!(isp, NOT_FOUND_PLACEHOLDER);
        }

        let unloaded = CachedLocator::new(Locator::new(Arc::new(DatabaseStore::new())));
        let [(_, city), _] = unloaded.header_values(Some("1.1.1.1"), "");
        assert_eq!(city, NOT_FOUND_PLACEHOLDER);
    }

    #[test]
    fn header_names_follow_config() {
        let config = LocatorConfig::from_json_str(
            r#"{"headers": {"city": "X-Country", "isp": "X-Region"}}"#,
        )
        .unwrap();
        let cached = cached().with_headers(config.headers);
        let [(city_name, city), (isp_name, _)] = cached.header_values(Some("1.1.1.9"), "");
        assert_eq!(city_name, "X-Country");
        assert_eq!(isp_name, "X-Region");
        assert_eq!(city, "Sydney");

        let partial = LocatorConfig::from_json_str(r#"{"headers": {"city": "X-City"}}"#).unwrap();
        assert_eq!(partial.headers.isp, HeaderNames::default().isp);

        let legacy: HeaderNames =
            serde_json::from_str(r#"{"country": "X-Country", "region": "X-Region"}"#).unwrap();
        assert_eq!(legacy.city, "X-Country");
        assert_eq!(legacy.isp, "X-Region");
    }
}

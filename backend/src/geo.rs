//! Approximate location of the client that scanned a coupon.

use crate::error::ServiceError;
use actix_web::HttpRequest;
use log::warn;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;

pub const LOCAL_NETWORK: &str = "Local network";
pub const UNKNOWN_LOCATION: &str = "Unknown";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: Option<String>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
}

impl IpApiResponse {
    fn describe(&self) -> Option<String> {
        if self.status.as_deref() == Some("fail") {
            return None;
        }
        let parts: Vec<&str> = [&self.city, &self.region_name, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeoLocator {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl GeoLocator {
    /// `base_url` gets the IP appended, e.g. `http://ip-api.com/json/`.
    /// `None` disables remote lookups.
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Internal(format!("http client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    /// Never fails: a lookup problem degrades to [`UNKNOWN_LOCATION`].
    pub async fn locate(&self, ip: Option<IpAddr>) -> String {
        let Some(ip) = ip else {
            return UNKNOWN_LOCATION.to_string();
        };
        if is_local(&ip) {
            return LOCAL_NETWORK.to_string();
        }
        let Some(base_url) = &self.base_url else {
            return UNKNOWN_LOCATION.to_string();
        };

        let url = format!("{}{}", base_url, ip);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("geolocation request for {} failed: {}", ip, e);
                return UNKNOWN_LOCATION.to_string();
            }
        };
        match response.json::<IpApiResponse>().await {
            Ok(body) => body
                .describe()
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            Err(e) => {
                warn!("geolocation response for {} unreadable: {}", ip, e);
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer.
pub fn client_ip(req: &HttpRequest) -> Option<IpAddr> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    header("x-forwarded-for")
        .and_then(|list| list.split(',').next().and_then(|ip| ip.trim().parse().ok()))
        .or_else(|| header("x-real-ip").and_then(|ip| ip.trim().parse().ok()))
        .or_else(|| req.peer_addr().map(|addr| addr.ip()))
}

fn is_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_local(&IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use rstest::rstest;

    #[rstest]
    #[case("127.0.0.1", true)]
    #[case("10.1.2.3", true)]
    #[case("192.168.0.10", true)]
    #[case("169.254.1.1", true)]
    #[case("::1", true)]
    #[case("fd00::1", true)]
    #[case("fe80::1", true)]
    #[case("::ffff:192.168.1.1", true)]
    #[case("8.8.8.8", false)]
    #[case("2001:4860:4860::8888", false)]
    fn local_ranges(#[case] ip: &str, #[case] local: bool) {
        assert_eq!(is_local(&ip.parse().unwrap()), local);
    }

    #[test]
    fn forwarded_for_wins() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.9, 10.0.0.1"))
            .insert_header(("X-Real-IP", "198.51.100.1"))
            .peer_addr("127.0.0.1:5000".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req), Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn falls_back_to_real_ip_then_peer() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "garbage"))
            .insert_header(("X-Real-IP", "198.51.100.1"))
            .to_http_request();
        assert_eq!(client_ip(&req), Some("198.51.100.1".parse().unwrap()));

        let req = TestRequest::default()
            .peer_addr("192.0.2.4:1234".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req), Some("192.0.2.4".parse().unwrap()));
    }

    #[test]
    fn describe_skips_missing_parts() {
        let body = IpApiResponse {
            status: Some("success".into()),
            city: Some("Dubai".into()),
            region_name: None,
            country: Some("United Arab Emirates".into()),
        };
        assert_eq!(body.describe().as_deref(), Some("Dubai, United Arab Emirates"));

        let failed = IpApiResponse {
            status: Some("fail".into()),
            city: None,
            region_name: None,
            country: None,
        };
        assert_eq!(failed.describe(), None);
    }

    #[actix_web::test]
    async fn local_and_disabled_lookups_do_not_touch_network() {
        let geo = GeoLocator::new(None, Duration::from_millis(50)).unwrap();
        assert_eq!(geo.locate(Some("10.0.0.1".parse().unwrap())).await, LOCAL_NETWORK);
        assert_eq!(geo.locate(Some("8.8.8.8".parse().unwrap())).await, UNKNOWN_LOCATION);
        assert_eq!(geo.locate(None).await, UNKNOWN_LOCATION);
    }
}

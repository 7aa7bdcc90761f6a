//! Extraction of the client IP signals from a request.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

/// Header set by the edge proxy (Cloudflare) with the original client IP.
pub const HEADER_EDGE_IP: &str = "cf-connecting-ip";
/// Header carrying the chain of proxied client addresses.
pub const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";

/// Raw IP signals of a request, as seen before any resolution.
///
/// Extraction never fails: every signal is optional. The peer address is
/// only present when the server was started with connect info.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub cf_ip: Option<String>,
    pub xff: Option<String>,
    pub remote: Option<IpAddr>,
}

impl ClientInfo {
    /// Reads the proxy headers. The peer address is left empty.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        ClientInfo {
            cf_ip: header_value(headers, HEADER_EDGE_IP),
            xff: header_value(headers, HEADER_FORWARDED_FOR),
            remote: None,
        }
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Falls back to `MockConnectInfo` when no real connect info is set.
        let remote = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientInfo {
            remote,
            ..ClientInfo::from_headers(&parts.headers)
        })
    }
}

/// Returns the first value of a header, if it is valid text.
fn header_value(headers: &HeaderMap, name: &'static str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> ClientInfo {
        let (mut parts, ()) = request.into_parts();
        let Ok(info) = ClientInfo::from_request_parts(&mut parts, &()).await;
        info
    }

    #[tokio::test]
    async fn reads_proxy_headers() {
        let request = Request::builder()
            .header("CF-Connecting-IP", "1.2.3.4")
            .header("X-Forwarded-For", "10.0.0.5, 8.8.8.8")
            .body(())
            .unwrap();

        let info = extract(request).await;

        assert_eq!(info.cf_ip.as_deref(), Some("1.2.3.4"));
        assert_eq!(info.xff.as_deref(), Some("10.0.0.5, 8.8.8.8"));
        assert_eq!(info.remote, None);
    }

    #[tokio::test]
    async fn reads_peer_address() {
        let mut request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 7], 55000))));

        let info = extract(request).await;

        assert_eq!(info.remote, Some("198.51.100.7".parse().unwrap()));
        assert_eq!(info.cf_ip, None);
        assert_eq!(info.xff, None);
    }

    #[tokio::test]
    async fn falls_back_to_mock_peer_address() {
        let mut request = Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(MockConnectInfo(SocketAddr::from(([203, 0, 113, 9], 40000))));

        let info = extract(request).await;

        assert_eq!(info.remote, Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn ignores_non_text_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HEADER_FORWARDED_FOR,
            axum::http::HeaderValue::from_bytes(b"\xff\xfe").unwrap(),
        );

        assert_eq!(ClientInfo::from_headers(&headers).xff, None);
    }
}

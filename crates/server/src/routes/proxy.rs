use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::HeaderName,
    response::Response,
};
use std::time::Duration;

use crate::AppState;
use crate::error::ApiErr;

/// Upstream requests are cut off after this long.
const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

/// Request bodies larger than this are rejected before forwarding.
const MAX_FORWARD_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Hop-by-hop headers (RFC 9110 §7.6.1) plus `host` and `content-length`,
/// which the forwarding client sets itself.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
            | "host"
            | "content-length"
    )
}

fn upstream_url(backend: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!("{}/{}", backend.trim_end_matches('/'), path);
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// ANY /api/proxy/{*path} — forward the request to the configured backend,
/// preserving method, query string, body, and end-to-end headers.
pub async fn forward(
    State(state): State<AppState>,
    Path(path): Path<String>,
    req: Request,
) -> Result<Response, ApiErr> {
    let Some(ref backend) = state.config.backend_url else {
        return Err(ApiErr::not_found("no proxy backend configured"));
    };

    let (parts, body) = req.into_parts();
    let url = upstream_url(backend, &path, parts.uri.query());

    let body = axum::body::to_bytes(body, MAX_FORWARD_BODY_BYTES)
        .await
        .map_err(|_| ApiErr::bad_request("request body too large"))?;

    let mut headers = axum::http::HeaderMap::new();
    for (name, value) in parts.headers.iter() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let upstream = state
        .http
        .request(parts.method, url.as_str())
        .headers(headers)
        .body(body.to_vec())
        .timeout(FORWARD_TIMEOUT)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!("proxy upstream {url}: {e}");
            ApiErr::bad_gateway("upstream request failed")
        })?;

    let status = upstream.status();
    let upstream_headers = upstream.headers().clone();
    let bytes = upstream.bytes().await.map_err(|e| {
        tracing::warn!("proxy upstream body {url}: {e}");
        ApiErr::bad_gateway("upstream request failed")
    })?;

    let mut response = Response::builder()
        .status(status)
        .body(Body::from(bytes))
        .map_err(ApiErr::from_db("build proxy response"))?;
    for (name, value) in upstream_headers.iter() {
        if !is_hop_by_hop(name) {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hop_by_hop_headers_are_stripped() {
        for name in ["connection", "transfer-encoding", "host", "content-length"] {
            assert!(is_hop_by_hop(&HeaderName::from_static(name)));
        }
        for name in ["authorization", "content-type", "accept", "x-request-id"] {
            assert!(!is_hop_by_hop(&HeaderName::from_static(name)));
        }
    }

    #[test]
    fn upstream_url_joins_path_and_query() {
        assert_eq!(
            upstream_url("https://backend.example/", "v1/items", Some("page=2")),
            "https://backend.example/v1/items?page=2"
        );
        assert_eq!(
            upstream_url("https://backend.example", "v1/items", None),
            "https://backend.example/v1/items"
        );
    }
}

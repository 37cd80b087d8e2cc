//! Plaintext responder that sends every request to HTTPS.

use axum::{
    Router,
    http::{HeaderMap, StatusCode, Uri, header::HOST},
    response::{IntoResponse, Redirect, Response},
};

/// Builds a router answering every request with a 308 to the HTTPS origin.
pub fn https_redirect_router(https_port: u16) -> Router {
    Router::new().fallback(move |uri: Uri, headers: HeaderMap| async move {
        redirect(&uri, &headers, https_port)
    })
}

fn redirect(uri: &Uri, headers: &HeaderMap, https_port: u16) -> Response {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.host());

    match host {
        Some(host) if !host.is_empty() => {
            Redirect::permanent(&https_target(host, https_port, uri)).into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "Missing Host header").into_response(),
    }
}

/// Computes `https://{host}{path}?{query}` for a plaintext request.
///
/// Any port on `host` is replaced by `https_port`, which is omitted when
/// it is 443. The `?` is dropped when the query is empty.
pub fn https_target(host: &str, https_port: u16, uri: &Uri) -> String {
    let host = strip_port(host);
    let mut target = if https_port == 443 {
        format!("https://{}", host)
    } else {
        format!("https://{}:{}", host, https_port)
    };

    target.push_str(uri.path());
    if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal, e.g. [::1]:8080
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

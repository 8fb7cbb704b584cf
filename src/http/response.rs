//! HTTP response building module
//!
//! Builders for every response the relay sends. A builder never panics: if
//! the response cannot be assembled the error is logged and a bare response
//! with the same body is returned.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Build the gzip-encoded attachment response
///
/// `Content-Length` is the length of the encoded body, which is what
/// actually goes over the wire.
pub fn build_download_response(
    encoded: Vec<u8>,
    disposition: &str,
    server_name: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = encoded.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(encoded)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Encoding", "gzip")
        .header("Content-Length", content_length)
        .header("Content-Type", "application/octet-stream")
        .header("Content-Disposition", disposition)
        .header("Cache-Control", "no-store")
        .header("Server", server_name)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build plain-text response with the given status
pub fn build_text_response(
    status: StatusCode,
    message: &'static str,
    server_name: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from_static(message.as_bytes())
    };

    Response::builder()
        .status(status)
        .header("Content-Type", TEXT_PLAIN)
        .header("Content-Length", message.len())
        .header("Server", server_name)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::from_static(message.as_bytes())))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS")
            .header("Access-Control-Expose-Headers", "Content-Disposition")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(413)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

/// Build health check response (for liveness/readiness probes)
pub fn build_health_response(status: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain")
        .header("Cache-Control", "no-cache, no-store")
        .body(Full::new(Bytes::from(status.to_string())))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::from("ok")))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_bytes(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_download_response_headers() {
        let resp = build_download_response(
            vec![1, 2, 3, 4],
            "attachment; filename=\"a.bin\"",
            "archive-relay",
            false,
        );
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers["Content-Encoding"], "gzip");
        assert_eq!(headers["Content-Length"], "4");
        assert_eq!(headers["Content-Type"], "application/octet-stream");
        assert_eq!(headers["Content-Disposition"], "attachment; filename=\"a.bin\"");
        assert_eq!(body_bytes(resp).await.as_ref(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_download_head_keeps_length() {
        let resp = build_download_response(vec![0; 10], "attachment", "s", true);
        assert_eq!(resp.headers()["Content-Length"], "10");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_text_response() {
        let resp = build_text_response(StatusCode::NOT_FOUND, "gone", "s", false);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["Content-Type"], TEXT_PLAIN);
        assert_eq!(body_bytes(resp).await.as_ref(), b"gone");
    }

    #[test]
    fn test_options_cors_headers() {
        let resp = build_options_response(true);
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        let resp = build_options_response(false);
        assert!(resp.headers().get("Access-Control-Allow-Origin").is_none());
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(build_404_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(build_405_response().status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(build_413_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(build_health_response("ok").status(), StatusCode::OK);
    }
}

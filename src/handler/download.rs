//! Archive download module
//!
//! Looks up `<root>/<id>.zip`, extracts entry zero, gzip-encodes it and
//! sends it as an attachment. The extracted copy is gone before the
//! response leaves this module.

use crate::archive::{ArchiveError, Identifier};
use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::io;
use std::sync::Arc;

/// Bytes ready to be sent for one archive
#[derive(Debug)]
struct Payload {
    id: Identifier,
    file_name: String,
    raw_size: u64,
    encoded: Vec<u8>,
}

/// Serve the archive named by the identifier query parameter
pub async fn serve_download(
    ctx: &RequestContext<'_>,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    let server_name = &state.config.http.server_name;

    match prepare_download(ctx.query, state).await {
        Ok(payload) => {
            logger::log_download(
                payload.id.as_str(),
                &payload.file_name,
                payload.raw_size,
                payload.encoded.len(),
            );
            http::build_download_response(
                payload.encoded,
                &http::attachment(&payload.file_name),
                server_name,
                ctx.is_head,
            )
        }
        Err(err) => error_response(&err, state, ctx.is_head),
    }
}

/// Extract the value of `name` from a raw query string.
/// The first occurrence wins.
pub fn query_value(query: Option<&str>, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

async fn prepare_download(
    query: Option<&str>,
    state: &Arc<AppState>,
) -> Result<Payload, ArchiveError> {
    let raw = query_value(query, &state.config.storage.query_param);
    let id = Identifier::parse(raw.as_deref(), &state.identifier_pattern)?;

    // Archive reads and compression block, keep them off the reactor
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || extract_and_encode(&state, id))
        .await
        .map_err(|e| ArchiveError::Extract(io::Error::other(e)))?
}

fn extract_and_encode(state: &AppState, id: Identifier) -> Result<Payload, ArchiveError> {
    let extracted = state.store.extract_first(&id)?;
    let data = extracted.read()?;
    let encoded = http::gzip_encode(&data, state.config.storage.compression_level)?;

    let file_name = extracted.file_name().to_string();
    let raw_size = extracted.size();
    let path = extracted.path().display().to_string();
    if let Err(e) = extracted.close() {
        logger::log_warning(&format!("Failed to remove extracted file '{path}': {e}"));
    }

    Ok(Payload {
        id,
        file_name,
        raw_size,
        encoded,
    })
}

fn error_response(err: &ArchiveError, state: &AppState, is_head: bool) -> Response<Full<Bytes>> {
    if err.is_client_error() {
        logger::log_warning(&format!("Download rejected: {err}"));
    } else {
        logger::log_error(&format!("Download failed: {err}"));
    }

    let status = if state.config.http.legacy_error_status {
        StatusCode::OK
    } else {
        err.status()
    };

    http::build_text_response(
        status,
        err.public_message(),
        &state.config.http.server_name,
        is_head,
    )
}

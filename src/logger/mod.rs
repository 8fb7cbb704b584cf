//! Logger module
//!
//! Provides logging utilities for the relay including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Leveled error, warning, info and debug logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::Level;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup. An unknown level falls
/// back to `info` with a warning.
pub fn init(config: &Config) -> std::io::Result<()> {
    let (level, level_error) = match config.logging.level.parse::<Level>() {
        Ok(level) => (level, None),
        Err(e) => (Level::Info, Some(e)),
    };

    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        level,
    )?;

    if let Some(e) = level_error {
        log_warning(&format!("{e}, using info"));
    }
    Ok(())
}

/// Write through the global writer, or straight to the console before init
fn write(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write(level, message),
        None if level >= Level::Warn => eprintln!("{message}"),
        None if level >= Level::Info => println!("{message}"),
        None => {}
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log_info("======================================");
    log_info("Archive relay started successfully");
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!(
        "Download endpoint: http://{addr}{}?{}=<id>",
        config.routes.download_path, config.storage.query_param
    ));
    log_info(&format!("Archive root: {}", config.storage.root.display()));
    log_info(&format!("Work directory: {}", config.storage.work_dir.display()));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
    if config.http.legacy_error_status {
        log_info("Error responses: status 200 (legacy)");
    } else {
        log_info("Error responses: status 400/404/500");
    }
    log_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write(
        Level::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_error(message: &str) {
    write(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(Level::Warn, &format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write(Level::Info, message);
}

pub fn log_debug(message: &str) {
    write(Level::Debug, &format!("[DEBUG] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_download(id: &str, file_name: &str, raw_bytes: u64, encoded_bytes: usize) {
    log_debug(&format!(
        "[Download] {id} -> {file_name} ({raw_bytes} bytes, {encoded_bytes} gzip)"
    ));
}

pub fn log_shutdown_requested(in_flight: usize) {
    log_info(&format!(
        "\n[Shutdown] Stopped accepting connections, {in_flight} still in flight"
    ));
}

pub fn log_shutdown_complete() {
    log_info("[Shutdown] Server stopped");
}

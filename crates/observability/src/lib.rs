//! Process-wide tracing setup shared by the server and the admin tooling.

pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize tracing with the format named by `LOG_FORMAT` (JSON by default).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    subscriber::init(format);
}

//! Process-wide logging setup shared by the service binaries.

pub mod tracing;

/// Initialize structured JSON logging filtered by `RUST_LOG`.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() {
    tracing::init();
}

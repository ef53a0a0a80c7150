//! Process-wide logging setup.

/// Initialize tracing with the service's default filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_DIRECTIVES);
}

/// Tracing configuration (filters, layers).
pub mod tracing;

//! Build identity constants.
//!
//! Three read-only strings fixed at compile time, consumed as log context by
//! the startup banner and the crash handlers. Nothing in the process mutates
//! them, which makes them safe to reference from signal context.

/// Build flavor the binary was compiled with.
pub const BUILD_TYPE: &str = if cfg!(debug_assertions) {
    "debug"
} else {
    "release"
};

/// Package version, stamped by Cargo.
pub const BUILD_ID: &str = env!("CARGO_PKG_VERSION");

/// Operating system the binary was compiled for.
pub const BUILD_OS: &str = std::env::consts::OS;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_identity_is_populated() {
        assert!(!BUILD_TYPE.is_empty());
        assert!(!BUILD_ID.is_empty());
        assert!(!BUILD_OS.is_empty());
    }
}

//! Shared constants for integration tests.
//!
//! Each top-level file in `tests/` compiles to its own crate, so shared
//! values live here and are pulled in with:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// Image reference used for scenario servers in tests.
pub const TEST_IMAGE_REF: &str = "cirros-0.6";

/// Primary flavor used by the tests.
pub const TEST_FLAVOR_REF: &str = "1";

/// Resize target flavor used by the tests.
pub const TEST_FLAVOR_REF_ALT: &str = "2";

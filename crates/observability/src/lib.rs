//! Process-wide tracing setup shared by binaries and tests.

pub mod logging;

pub use logging::{DEFAULT_FILTER, init, init_with_default_filter};

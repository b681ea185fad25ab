//! The `utils` module holds the pieces shared by the library and the CLI:
//! error types and logging setup.

pub mod error;
pub mod logging;

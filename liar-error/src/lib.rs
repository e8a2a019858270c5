//! # liar-error
//!
//! Unified error handling for the liar game crates.
//!
//! - **ErrorKind**: what went wrong (e.g. `InferenceFailed`, `ConfigInvalid`)
//! - **ErrorStatus**: whether trying again could help
//! - **Context**: the operation and key/value pairs for locating the cause
//! - **Source**: the wrapped underlying error
//!
//! ```rust
//! use liar_error::{Error, ErrorKind};
//!
//! fn load() -> liar_error::Result<()> {
//!     Err(Error::new(ErrorKind::ConfigInvalid, "duplicate player name")
//!         .with_operation("config::validate")
//!         .with_context("player", "Alice"))
//! }
//!
//! assert_eq!(load().unwrap_err().kind(), ErrorKind::ConfigInvalid);
//! ```
//!
//! An error is converted once, where it enters the workspace. Layers above
//! only append context.

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the workspace `Error`
pub type Result<T> = std::result::Result<T, Error>;

//! Use-case services over the decorator and engines.
//!
//! # Responsibility
//! - Drive checks end to end and keep session state out of the host UI.
//!
//! # See also
//! - `crate::decorator` for the editable-side operations.

pub mod session;

pub use session::{CheckReport, CheckSession, SessionError};

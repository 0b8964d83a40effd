//! Data models for the FogBugz XML API.
//!
//! This module contains the decoded record types, session state and
//! the helper types used to build case and view commands.

mod case;
mod record;
mod session;

pub use case::*;
pub use record::*;
pub use session::*;

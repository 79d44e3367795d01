//! Route handlers for the REST API
//!
//! - [`batch`] - The `POST /` batch download endpoint
//! - [`system`] - Health, stats, OpenAPI

mod batch;
mod system;

pub use batch::*;
pub use system::*;

// Library surface for the binary and integration tests.
pub mod app_dirs;
pub mod config;
pub mod corpus;
pub mod error;
pub mod feedback;
pub mod fitness;
pub mod language;
pub mod profile;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod util;

pub use error::{ClozeError, Result};

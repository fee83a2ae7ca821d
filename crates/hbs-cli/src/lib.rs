//! Library side of the `hbs` command line tool.

pub mod logging;
pub mod workspace;

pub use workspace::{TableForm, Workspace};

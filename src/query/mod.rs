//! Query Language
//!
//! Line-oriented commands over a loaded store, used by the CLI.

mod command;
mod handler;
mod response;

pub use command::{Command, ExportFormat, DEFAULT_RESULTS};
pub use handler::Handler;
pub use response::{Response, StoreInfo};

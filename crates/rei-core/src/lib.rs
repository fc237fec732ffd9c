pub mod activity;
pub mod actor;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod io;
pub mod location;
pub mod paths;
pub mod policy;
pub mod token;
pub mod types;
pub mod users;

pub use error::{ReiError, Result};

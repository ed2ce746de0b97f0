pub mod aggregate;
pub mod chart;
pub mod cli;
pub mod config;
pub mod distribution;
pub mod error;
pub mod history;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod releases;
pub mod source;
pub mod store;
pub mod util;

pub use error::{Result, StatsError};

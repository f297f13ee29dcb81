//! Resume ranker library

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{Result, ResumeRankerError};

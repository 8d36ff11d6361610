pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::http::{build_router, run_server, AppState};
pub use adapters::proj::ProjRegistry;
pub use config::{AppConfig, CliArgs};
pub use core::convert::Converter;
pub use utils::error::{ConverterError, Result};

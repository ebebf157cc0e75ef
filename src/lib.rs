pub mod api;
#[cfg(test)]
pub(crate) mod canned_server;
pub mod config;
pub mod error;
pub mod http_client;
pub mod intake;
pub mod models;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use intake::{IntakeServices, IntakeSettings, LoanIntakeSession};

//! Legal advisor workflow: incident → BNS sections → prompt → model answer.

mod error;
pub use error::AdvisorError;

pub mod config;
pub use config::AdvisorConfig;

mod retriever;
pub use retriever::Retriever;

mod advisor;
pub use advisor::{Advisor, Consultation, Outcome, Phase};

pub mod status;
pub use status::{check_status, SystemStatus};

#[cfg(test)]
mod testing;

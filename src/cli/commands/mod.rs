//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod plan;
mod profiles;
mod search;
mod serve;
mod weather;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use plan::run_plan;
pub use profiles::run_profiles;
pub use search::run_search;
pub use serve::run_serve;
pub use weather::run_weather;

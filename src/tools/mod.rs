//! Tools the chat model can call.

mod confirmation;
mod weather;
mod web_search;

pub use confirmation::ConfirmationTool;
pub use weather::WeatherTool;
pub use web_search::WebSearchTool;

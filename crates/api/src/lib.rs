mod error;
mod llm;
pub mod models;
mod prompts;
pub mod routes;
mod service;
mod startup;
mod utils;

pub use error::*;
pub use llm::*;
pub use models::*;
pub use prompts::*;
pub use routes::*;
pub use service::*;
pub use startup::*;
pub use utils::*;

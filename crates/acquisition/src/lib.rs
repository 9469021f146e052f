mod catalog;
mod consolidate;
mod csv_export;
mod domains;
mod error;
mod http;
mod model;
mod orchestrator;
mod query;
mod session;
mod source;
mod stats;
mod utils;

pub use catalog::*;
pub use consolidate::*;
pub use csv_export::*;
pub use domains::*;
pub use error::*;
pub use http::*;
pub use model::*;
pub use orchestrator::*;
pub use query::*;
pub use session::*;
pub use source::*;
pub use stats::*;
pub use utils::*;

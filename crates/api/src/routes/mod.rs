pub mod chat;
pub mod csv;
pub mod predict;

pub use chat::*;
pub use csv::*;
pub use predict::*;

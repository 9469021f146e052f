mod client;
mod extract;
mod grid;
mod reader;
mod search;

pub use client::*;
pub use extract::*;
pub use grid::*;
pub use reader::*;
pub use search::*;

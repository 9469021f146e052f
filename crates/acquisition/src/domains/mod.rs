mod giovanni;
mod granules;

pub use giovanni::*;
pub use granules::*;

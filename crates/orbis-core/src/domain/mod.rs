//! Geographic domain entities.
//!
//! Every entity derives `Serialize`/`Deserialize` because list and detail
//! results are cached as JSON; field names on the wire follow the dataset
//! the service was seeded from (`emojiU`, `countryId`, `zoneName`, ...).

mod city;
mod country;
mod state;

pub use city::*;
pub use country::*;
pub use state::*;

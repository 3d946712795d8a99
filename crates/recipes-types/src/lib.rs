pub mod claim;
pub mod config;
pub mod culture;
pub mod general;
pub mod utils;

pub use culture::Culture;

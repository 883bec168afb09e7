#[macro_use]
mod macros;

pub mod capacity;
pub mod current;
pub mod power;
pub mod temperature;
pub mod voltage;

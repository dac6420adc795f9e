#[macro_use]
pub mod macros;

pub mod energy;
pub mod mass;
pub mod power;
pub mod ratio;
pub mod time;

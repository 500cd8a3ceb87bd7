#![forbid(unsafe_code)]

pub mod generator;
pub mod model;
pub mod time;
pub mod timer;

pub use time::Clock;

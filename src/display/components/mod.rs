//! Drawn display components

pub mod clock;
pub mod placeholder;

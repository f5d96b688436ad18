pub mod cli;
pub mod graph;
pub mod logging;
pub mod midi;
pub mod ump;

pub mod commands;
pub mod logging;
mod print;
pub mod setup;

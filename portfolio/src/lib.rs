pub mod commands;
mod database;
pub mod environment;

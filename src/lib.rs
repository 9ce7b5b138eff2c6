pub mod banner;
pub mod chat;
pub mod commands;
pub mod config;
pub mod consts;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod interrupt;
pub mod spinner;
pub mod surface;

pub mod config;
pub mod edit;
pub mod events;
pub mod new;
pub mod participants;
pub mod session;

mod details;
mod wizard;

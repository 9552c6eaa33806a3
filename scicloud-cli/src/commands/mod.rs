pub mod add;
pub mod agenda;
pub mod config;
pub mod delete;
pub mod edit;
pub mod export;
pub mod list;
pub mod move_event;
pub mod show;

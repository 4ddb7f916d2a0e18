pub mod config_io;
pub mod organizer;
pub mod store;

pub mod record;
pub mod settings;
pub mod config;

pub use record::*;
pub use settings::*;
pub use config::*;

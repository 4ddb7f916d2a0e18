pub mod import;
pub mod search;
pub mod stats;
pub mod validate;

pub mod models;
pub mod source;
pub mod store;

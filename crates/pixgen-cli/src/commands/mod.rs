pub mod config;
pub mod docs;
pub mod expand;
pub mod generate;
pub mod list;

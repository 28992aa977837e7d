pub mod condition;
pub mod config;
pub mod daterange;
pub mod executor;
pub mod group;
pub mod list;
pub mod value;

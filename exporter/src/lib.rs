pub mod core;
pub mod domain;
pub mod utils;

mod app;

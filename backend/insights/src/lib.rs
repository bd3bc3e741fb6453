#![allow(dead_code)]

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;

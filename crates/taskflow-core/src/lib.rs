pub mod engine;
pub mod filter;
pub mod i18n;
pub mod models;
pub mod persistence;
pub mod projection;
pub mod service;
pub mod sqlite;

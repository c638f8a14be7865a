pub mod alerts;
pub mod analysis;
pub mod api;
pub mod benchmark;
pub mod collector;
pub mod filters;
pub mod models;

//! Querypad: run SQL, InfluxQL and Flux queries against InfluxDB and render
//! the rows as CSV, annotated CSV, or line protocol.

mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;

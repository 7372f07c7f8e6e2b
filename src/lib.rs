pub mod application;
pub mod db;
pub mod domain;
pub mod routes;
pub mod settings;
pub mod telemetry;

pub mod api;
pub mod auth;
pub mod config;
pub mod data_models;
pub mod db;
pub mod error;
pub mod mail;
pub mod search;
pub mod uploads;
pub mod urls;

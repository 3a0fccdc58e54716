pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod crm;
pub mod error;
pub mod gate;
pub mod i18n;
pub mod pages;

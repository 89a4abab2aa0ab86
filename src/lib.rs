pub mod api;
pub mod app;
pub mod bus;
pub mod chat;
pub mod config;
pub mod handle;
pub mod interface;
pub mod route;
pub mod session;
pub mod store;
pub mod views;

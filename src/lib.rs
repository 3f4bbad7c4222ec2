pub mod app;
pub mod assistant;
pub mod config;
pub mod device;
pub mod logging;
pub mod model;
pub mod route;
pub mod session;
pub mod tasks;
pub mod ui;
pub mod verify;
pub mod view;

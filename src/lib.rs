//! mosaic - terminal client for the iNitro customer data platform
//!
//! The library holds everything the `mosaic` binary drives: the backend
//! gateway, the local session store, the wizard state machine, the page
//! flows built on it and the terminal UI.

pub mod api;
pub mod app;
pub mod config;
pub mod flows;
pub mod logging;
pub mod store;
pub mod ui;
pub mod wizard;

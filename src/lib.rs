pub mod error;
pub mod validation;
pub mod config;
pub mod model;
pub mod ops;
pub mod fritzbox;
pub mod import;
pub mod cli;

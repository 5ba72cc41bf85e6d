// Library for tests to access modules

pub mod audit_repo;
pub mod config;
pub mod error;
pub mod history_repo;
pub mod models;
pub mod report;
pub mod session_repo;
pub mod snapshot_builder;
pub mod worker;

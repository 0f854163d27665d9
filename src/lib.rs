// Library for tests to access modules

pub mod collector;
pub mod config;
pub mod dataset;
pub mod models;
pub mod probe_repo;
pub mod schedule;
pub mod stats;
pub mod transform;
pub mod version;

//! Data models shared by the pipeline stages.

pub mod config;
pub mod invoice;
pub mod ledger;

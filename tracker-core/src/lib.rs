pub mod activity;
pub mod auth;
pub mod draft;
pub mod error;
pub mod identity;
pub mod model;
pub mod policy;
pub mod repo;
pub mod stats;
pub mod store;

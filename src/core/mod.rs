//! Core mediation components

pub mod audit;
pub mod cache;
pub mod cost;
pub mod gateway;
pub mod provider;
pub mod registry;
pub mod reliability;
pub mod safety;
pub mod types;

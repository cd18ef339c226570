//! PropDesk Library
//!
//! Backend for the PropDesk prop-trading customer portal

pub mod api;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod providers;
pub mod registry;
pub mod types;
pub mod validation;

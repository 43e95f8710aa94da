//! HTTP route handlers

pub mod estimate;
pub mod page;

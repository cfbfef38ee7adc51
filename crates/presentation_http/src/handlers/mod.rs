//! HTTP request handlers

pub mod dav;
pub mod health;
pub mod well_known;

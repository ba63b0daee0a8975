//! HTTP boundary for the Star Sailors deployment service
//!
//! The binaries are thin: `starsailors-server` serves [`http::HttpServer`]
//! and `starsailors-status` prints engine output for one user.

pub mod auth;
pub mod http;
pub mod params;

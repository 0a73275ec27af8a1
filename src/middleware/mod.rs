//! Middleware module - rate limiting

pub mod rate_limit;

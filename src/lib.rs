//! Bitable product catalog.
//!
//! Serves a product catalog read from a Feishu Bitable table. Records are
//! cached in memory for a fixed TTL, attachment fields are rewritten to local
//! proxy URLs, and the proxy streams those files from Feishu using the
//! server's tenant access token.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod feishu;
pub mod proxy;
pub mod web;

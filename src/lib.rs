//! Vein - template page server
//!
//! An accept loop that hands every connection to its own session, and an
//! index over parsed HTML templates so handlers can fill in dynamic values
//! without re-parsing.

pub mod config;
pub mod html;
pub mod http;
pub mod router;
pub mod server;

//! Domain types and pure logic for the IICGP attendance workflow.
//!
//! Nothing in this crate performs I/O. The HTTP boundary lives in
//! `iicgp-client`; everything here operates on already-fetched data.

pub mod access;
pub mod culto;
pub mod dashboard;
pub mod error;
pub mod member;
pub mod presence;
pub mod roles;
pub mod stats;
pub mod types;
pub mod user;

//! Sourcecast - source client utilities for Icecast streaming
//!
//! This library crate exposes configuration and command building for
//! integration testing. Charset, quoting, URL and pid-file helpers live in
//! `sourcecast-util`.

pub mod command;
pub mod config;

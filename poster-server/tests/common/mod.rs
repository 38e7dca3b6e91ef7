//! Shared integration test utilities.

#![allow(dead_code)]

pub mod server;

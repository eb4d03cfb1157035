//! Core building blocks: transport, auth primitives, poll engine, wire types.

pub mod auth;
pub mod http;
pub mod logging;
pub mod models;
pub mod poller;

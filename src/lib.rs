//! Relays RSS articles from configured feed routes onto a message queue.
//!
//! A run fetches each route, keeps the `<item>`s published inside an
//! inclusive UTC time window, and sends one JSON message per article.

pub mod config;
pub mod feed;
pub mod message;
pub mod queue;
pub mod relay;

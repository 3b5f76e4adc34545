//! hushbox - hide secret messages inside images and audio.
//!
//! A client for a remote steganography service. The library holds the form logic:
//! - Carrier selection with scoped preview URLs
//! - Request validation and routing per operation and medium
//! - Submission with upload progress and a decode attempt lockout
//! - Debounced scanning of the message for sensitive content
//!
//! The binary wraps it in a terminal front end.

pub mod analyzer;
pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod file;
pub mod form;
pub mod lockout;
pub mod preview;
pub mod progress;
pub mod request;
pub mod secret;
pub mod service;
pub mod strength;
pub mod types;
pub mod ui;

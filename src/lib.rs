//! StyleTry Try-On Lifecycle Client
//!
//! This library implements the asynchronous job lifecycle for the StyleTry
//! virtual try-on service: submitting a user photo plus garment image,
//! classifying the response as immediate or deferred, polling a pending job
//! under a bounded time budget, and reconciling late-arriving results with
//! already-stopped polling. History recording and path auditing are consumed
//! as external collaborators behind traits.

pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod services;

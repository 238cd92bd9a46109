//! Headless runner for symbiolab worlds.

pub mod app;

//! Settings synchronization core of the ring light controller: per-display
//! overlay settings, pushed to the overlay backend on every change and
//! persisted after a quiet period.

pub mod backend;
pub mod bootstrap;
pub mod color;
pub mod engine;
pub mod engine_config;
pub mod persistence;
pub mod ring_light;
pub mod ui_event;

#[cfg(test)]
mod tests;

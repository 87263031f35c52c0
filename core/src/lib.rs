//! Core of the six-round horse racing game: roster and schedule
//! generation, race physics, and the engine that sequences races,
//! handles pause/resume and persists the durable state.

pub mod clock;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod physics;
pub mod rng;
pub mod roster;
pub mod schedule;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;

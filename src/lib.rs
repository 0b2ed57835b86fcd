//! Chemotactic particle simulation: Physarum-style trail following, boids
//! flocking and probabilistic sticky aggregation over a diffusing scalar
//! field, with a terminal front-end.

pub mod app;
pub mod behavior;
pub mod braille;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod field;
pub mod food;
pub mod particles;
pub mod presets;
pub mod rng;
pub mod settings;
pub mod simulation;
pub mod spatial;
pub mod ui;

pub use error::{Result, SimError};
pub use settings::SimulationParams;
pub use simulation::{Simulation, SimulationState, SimulationStats};

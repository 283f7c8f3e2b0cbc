//! Application layer: manifest resolution and the mirror pipeline

pub mod services;
pub mod use_cases;

//! Domain layer: manifest model and workspace layout

pub mod entities;
pub mod value_objects;

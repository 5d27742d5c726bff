//! Core library for turning scattered survey points into a regular height
//! grid and a numbered quadrilateral mesh.
//!
//! The pipeline runs [`grid::build_grid`], [`dtm::interpolate`] and
//! [`mesh::extract`] in sequence; [`surface::SurfaceGrid::build`] does all
//! three. Results are handed to the writers in [`sink`].

pub mod dtm;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod io;
pub mod mesh;
pub mod settings;
pub mod sink;
pub mod surface;

pub use error::{Error, Result};
pub use surface::SurfaceGrid;

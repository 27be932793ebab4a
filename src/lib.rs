//! # quickhull3d
//!
//! A half-edge mesh implementation of Quickhull for computing 3D convex
//! hulls.
//!
//! ## References
//!
//! - C. Bradford Barber et al. 1996. [The Quickhull Algorithm for Convex Hulls](https://www.cise.ufl.edu/~ungor/courses/fall06/papers/QuickHull.pdf) (the original paper)
//! - Dirk Gregorius. GDC 2014. [Physics for Game Programmers: Implementing Quickhull](https://archive.org/details/GDC2014Gregorius)

#![warn(missing_docs, clippy::all)]

mod checker;
mod error;
mod mesh;
mod quickhull;
mod vec3;

pub use error::QhullError;
pub use quickhull::QuickHull3d;

#[cfg(test)]
mod tests;

//! Derivative-free numerical optimization
//!
//! Used by the distribution fitter to maximize likelihoods over bounded,
//! reparameterized spaces.

mod nelder_mead;

pub use nelder_mead::{Minimum, NelderMeadSettings, minimize};

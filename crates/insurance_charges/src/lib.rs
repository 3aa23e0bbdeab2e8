//! Insurance charges model
//!
//! Hyperparameter sweep, training and serving of a gradient-boosted
//! regression model for medical insurance charges.

pub mod commands;

//! Runnable demonstrations of the engine, one parameter set per module.

pub mod sir_demo;

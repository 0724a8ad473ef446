//! Concrete disease models built on top of the generic engine.

pub mod sir_metapop;

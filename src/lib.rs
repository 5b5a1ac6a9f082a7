//! Grid Traffic Simulation Library
//!
//! A discrete-time traffic simulation on a grid city of one-way roads,
//! parking spots and stoplights.

pub mod simulation;

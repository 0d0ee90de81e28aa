//! Structural analysis of the simultaneous (lag-0) network.
pub mod topology;

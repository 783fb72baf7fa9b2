//! Core domain types
//!
//! This module contains the structures shared between the lifecycle client
//! (which talks to the control plane) and the runner (which drives polling).

pub mod poll;
pub mod workload;

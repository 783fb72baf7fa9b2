//! Jobcheck Core
//!
//! Core types and abstractions for verifying ephemeral workloads.
//!
//! This crate contains:
//! - Domain types: Workload identity and descriptor, pod references, poll results
//! - DTOs: Kubernetes wire objects exchanged with the control plane
//! - Descriptor builder: Produces a fresh workload descriptor per verification run

pub mod descriptor;
pub mod domain;
pub mod dto;

pub use descriptor::{DescriptorBuilder, DescriptorError};

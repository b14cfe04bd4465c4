//! Core library for the mortgage underwriting service.
//!
//! The interesting part lives in [`workflows::loans`]: a deterministic,
//! policy-driven risk assessment engine plus the intake and service plumbing
//! around it. Document extraction, knowledge-base retrieval, and agent
//! orchestration are external collaborators; this crate only consumes their
//! already-decoded structured output.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

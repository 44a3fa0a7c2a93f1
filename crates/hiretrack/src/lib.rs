//! Onboarding decision engine for call-center hiring.
//!
//! The `workflows` tree holds the pure derivations (interview scoring, stage
//! progression, cohort eligibility and progress) together with the service
//! facade and router that persist their results through injected repositories.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

pub mod cohort;
pub mod monitor;
pub mod onboarding;

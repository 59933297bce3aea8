//! Domain layer for API Guardian
//!
//! CDD Principle: Domain Model - Pure business logic for convention enforcement
//! - Contains all core entities, value objects, and domain services
//! - Independent of infrastructure concerns like file systems or external registries
//! - Expresses the ubiquitous language of conformance checking and violation reporting

pub mod violations;

// Re-export main domain types for convenience
pub use violations::*;

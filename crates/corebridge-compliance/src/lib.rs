//! Regulatory rule engine for field mappings.
//!
//! Five rules cover the regimes a core-banking migration touches:
//! GLBA privacy notes, PCI cardholder storage, BSA/AML audit trails,
//! SOX confidence floors, and audit-field coverage.

pub mod engine;

pub use engine::scan;

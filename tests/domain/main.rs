//! Integration tests for Layer 3: Domain
//!
//! Tests the course-management contracts working against real stores,
//! across transactions, profiles and loader dispatch.

mod courses;
mod profiles;

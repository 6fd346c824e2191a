//! Integration tests for Layer 2: Stores
//!
//! Tests for the memory and null stores, identifier generators, loaders,
//! managers and loader dispatch.

mod fixture;
mod generators;
mod managers;

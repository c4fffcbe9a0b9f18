//! # lamina-module
//!
//! Resolves a serverless function module configuration into a declared
//! resource graph.
//!
//! Handles:
//! - **Config**: The configuration record and its YAML/JSON loader.
//! - **Validator**: Collects every input violation before anything else runs.
//! - **Flags**: Booleans derived from combinations of inputs.
//! - **Assembler**: Conditional resource declaration and dependency wiring.
//! - **Graph**: Resource nodes, references, and deployment ordering.
//! - **Outputs**: Absent-safe projection of named values.
//! - **Resolver**: The end-to-end [`resolve`] entry point.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod arn;
pub mod assembler;
pub mod config;
pub mod flags;
pub mod graph;
pub mod outputs;
pub mod resolver;
pub mod validator;

pub use resolver::{Resolution, resolve};

//! # SQL Guardrails Library
//!
//! Fail-closed evaluation and rewriting of untrusted SQL against per-catalog
//! security policies. See [`engine::evaluate`].

pub mod app;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod policy;
pub mod query;
pub mod resolve;
pub mod rewrite;
pub mod rules;

// crates/autonomy-kernel-config/src/lib.rs
// ============================================================================
// Module: Autonomy Kernel Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for autonomy-kernel.toml semantics.
// Dependencies: autonomy-kernel-core, autonomy-kernel-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `autonomy-kernel-config` defines the configuration model for the kernel:
//! accepted envelope signing algorithms, executor tool policy, receipt and
//! artifact storage backends, the audit sink, and the trusted signer key.
//! Loading is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;

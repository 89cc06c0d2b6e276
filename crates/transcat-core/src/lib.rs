//! Core types for transcat: the source catalog data model and configuration.
//!
//! Provides the function table that maps translation helpers (`__`, `trans`,
//! `trans_choice`) to a [`source::SourceKind`], the missing-source policy,
//! and the `.transcat/config.toml` loader.

pub mod config;
pub mod source;

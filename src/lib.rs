#![doc = "icon-bundler: icon asset regeneration pipeline."]

//! This crate contains the full regeneration pipeline for derived icon asset
//! bundles: a directory-backed icon store, sprite and webfont bundle builders,
//! and the orchestrator that keeps generated artifacts consistent with the
//! current icon set after every add/delete.
//!
//! HTTP routing, authentication and upload parsing are external collaborators;
//! they drive the pipeline through [`regenerate::Regenerator`] and the traits
//! in [`contract`].

pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod font;
pub mod glyphs;
pub mod ident;
pub mod load_config;
pub mod metadata;
pub mod regenerate;
pub mod sprite;
pub mod store;

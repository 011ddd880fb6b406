//! modup - Dependency updater for module-graph projects
//!
//! This library provides the core functionality for updating dependencies
//! referenced from ES modules, import maps, and lockfiles:
//! - jsr packages (`jsr:@scope/name@constraint`)
//! - npm packages (`npm:name@constraint`)
//! - Versioned remote modules (`https://deno.land/std@0.222.0/...`)

pub mod aggregate;
pub mod cli;
pub mod domain;
pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod registry;
pub mod resolve;
pub mod source;
pub mod vcs;

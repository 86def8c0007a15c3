// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Structure-to-scene import pipeline for molecular structures.
//!
//! Turns a parsed PDB, PDBx/mmCIF or MMTF structure into what a 3D host
//! application needs to show it: per-atom annotations with resolved entity
//! ids and secondary structure, unique chain ids, biological assembly
//! descriptors and the rigid transforms used to instance assembly copies.
//!
//! # Key entry points
//!
//! - [`pipeline::import_structure`] - load a structure and build its scene
//!   object in one call
//! - [`molecule::Molecule`] - a loaded structure with resolved entity ids
//! - [`assembly::extract_transforms`] - per-copy transforms of one
//!   biological assembly
//! - [`options::ImportOptions`] - per-import configuration with TOML presets
//!
//! # Architecture
//!
//! File decoding and the host application stay outside the crate, behind
//! the [`loader::StructureLoader`] and [`scene::HostScene`] traits. Missing
//! enrichment data (entities, secondary structure, assemblies) degrades to
//! `None`; unreadable files and host scene failures abort the import.

pub mod assembly;
pub mod error;
pub mod loader;
pub mod molecule;
pub mod options;
pub mod pipeline;
pub mod scene;
pub mod structure;

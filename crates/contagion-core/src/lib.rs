//! Core types for the contagion agent simulator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! identifiers shared by the arena and the scheduler: slot indices, mask
//! handles, place and disease IDs, the simulation day counter, and the
//! closed set of place kinds.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod kind;

pub use id::{Day, DiseaseId, MaskId, PlaceId, Slot};
pub use kind::PlaceKind;

#![doc(html_root_url = "https://docs.rs/chassis/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A retained virtual tree with keyed reconciliation over a pluggable render surface.
//!
//! Describe the desired tree as [`VNode`]s, mount it through an [`App`], and hand updated
//! descriptions to the engines: the keyed sequence diff ([`diff::diff_slices`]) decides which
//! surface nodes are created, removed, moved or patched in place, so element state and component
//! instances survive reordering. The surface itself is abstract ([`Surface`]); an arena-backed
//! in-memory implementation ([`memory::MemorySurface`]) ships for tests and headless use.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod app;
pub mod component;
pub mod destroy;
pub mod diff;
pub mod dispatcher;
pub mod error;
pub mod memory;
pub mod mount;
pub mod node;
pub mod patch;
pub mod scheduler;
pub mod surface;
pub mod value;

pub use app::{App, AppContext};
pub use component::{handler, Component, ComponentDef, State};
pub use destroy::destroy;
pub use error::Error;
pub use mount::mount;
pub use node::{same_node, Child, Kind, Props, VNode};
pub use patch::patch;
pub use surface::{BoundListener, SharedSurface, Surface};
pub use value::Value;

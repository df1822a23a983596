//! Rowhammer Attack Configuration Builder.
//!
//! This library turns the layout descriptor emitted by the compiler and the final linked
//! binary into the attack configuration read by the loader at run time.
//! It is organized into several modules:
//! - `config`: CLI configuration.
//! - `descriptor`: Layout descriptor parsing.
//! - `binary`: Section and segment lookup in the linked binary.
//! - `resolver`: Placement of victims in file pages and physical frames.
//! - `layout`: Per-page victim frames.
//! - `pattern`: Aggressor pattern deduplication.
//! - `writer`: Attack configuration output.
//! - `builder`: The pipeline tying it together.

pub mod binary;
pub mod builder;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod layout;
pub mod pattern;
pub mod resolver;
pub mod utils;
pub mod writer;

pub use error::{BuildError, Result};

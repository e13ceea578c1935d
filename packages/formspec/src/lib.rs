//! Formspec dialog core.
//!
//! Parses the bracket/semicolon formspec text protocol into an element tree,
//! resolves cascading styles, lays elements out in pixels under the legacy or
//! real coordinate system, and drives the pointer interaction machine that
//! turns clicks and drags over inventory grids into move/drop/craft actions.
//!
//! Rendering, fonts, textures, networking, and inventory storage are all
//! collaborator traits; this crate owns only layout and interaction state.

#[macro_use]
extern crate tracing;

pub mod logging;
pub mod settings;
pub mod text;
pub mod color;
pub mod inventory;
pub mod style;
pub mod field;
pub mod table;
pub mod tree;
pub mod geom;
pub mod parse;
pub mod interact;
pub mod submit;
pub mod menu;

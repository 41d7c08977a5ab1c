//! Card sheet layout: how many rounded-rectangle cards fit on a sheet of
//! paper, where they go, and the cut and registration artwork that goes with
//! the sheet.
//!
//! Pure geometry over immutable inputs, `no_std` compatible with `alloc`.
//! The `std` feature adds the JSON preset table, file output and
//! `std::error::Error` impls.
//!
//! # Modules
//!
//! - [`units`] — Physical sizes (`63mm`, `2.5in`, raw pixels) and pixel conversion
//! - [`solver`] — Grid packing, margin relaxation, bleed and outer space
//! - [`config`] — Named card and paper presets, default resolution and marks
//! - [`request`] — Preset resolution, custom sizes, result naming and manifest
//! - [`dxf`] — Rounded-rectangle cut templates as ASCII DXF
//! - [`marks`] — Registration mark geometry
//! - `svg` — Layout preview and registration mark sheets (feature `svg`)

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod config;
pub mod dxf;
pub mod marks;
pub mod request;
pub mod solver;
pub mod units;

#[cfg(feature = "svg")]
pub mod svg;

// Re-exports: core types from solver module
pub use solver::{
    CardSpec, LayoutError, LayoutGrid, MarginRelaxation, Orientation, PaperSpec,
    RegistrationMarks, SpacingPolicy, solve,
};
pub use config::{ConfigError, Presets};
pub use dxf::{CutTemplate, DxfUnits};
pub use marks::MarkSheet;
pub use request::{
    CUSTOM, LayoutRequest, LayoutResult, Overrides, RequestError, ResolvedLayout,
    ValidationError, generate_layout, resolve_layout, resolve_mark_sheet,
};
pub use units::{Dimension, ParseError, Unit, parse_size};

//! Cut templates as ASCII DXF.
//!
//! Each card is one rounded rectangle: four straight edges and four
//! quarter arcs at the corners. DXF arcs always run counter-clockwise, so
//! every corner is written from its lower angle to its higher one.
//!
//! ```
//! use cardsheet::dxf::{CutTemplate, DxfUnits};
//!
//! let template = CutTemplate {
//!     name: "demo".into(),
//!     units: DxfUnits::Millimeters,
//!     card_width: 63.0,
//!     card_height: 88.0,
//!     radius: 3.0,
//!     origins: vec![(10.0, 10.0)],
//! };
//! let dxf = template.to_dxf();
//! assert_eq!(dxf.matches("\nLINE\n").count(), 4);
//! assert_eq!(dxf.matches("\nARC\n").count(), 4);
//! ```

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::solver::{CardSpec, LayoutGrid, Orientation};
use crate::units::{MM_PER_INCH, Unit};

/// Drawing units written to the DXF header.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DxfUnits {
    Millimeters,
    Inches,
}

impl DxfUnits {
    /// `$INSUNITS` code.
    pub const fn insunits(self) -> u8 {
        match self {
            DxfUnits::Inches => 1,
            DxfUnits::Millimeters => 4,
        }
    }

    /// Physical length of `px` device pixels.
    fn from_px(self, px: u32, ppi: u32) -> f64 {
        match self {
            DxfUnits::Millimeters => px as f64 * MM_PER_INCH / ppi as f64,
            DxfUnits::Inches => px as f64 / ppi as f64,
        }
    }
}

/// Cut outline for every card on a sheet, in drawing units.
#[derive(Clone, Debug, PartialEq)]
pub struct CutTemplate {
    /// File stem of the written template.
    pub name: String,
    pub units: DxfUnits,
    /// Outline size in physical card orientation.
    pub card_width: f64,
    pub card_height: f64,
    pub radius: f64,
    /// Top-left corner of each card in sheet space (y down), written
    /// unflipped as the outline's minimum corner.
    pub origins: Vec<(f64, f64)>,
}

impl CutTemplate {
    /// Outline every placed card of `grid`.
    ///
    /// Units follow the card width: inches when it was given in inches,
    /// millimeters otherwise. For [`Orientation::Horizontal`] the outline is
    /// rotated to match the packed footprint.
    pub fn from_grid(
        name: impl Into<String>,
        card: &CardSpec,
        orientation: Orientation,
        grid: &LayoutGrid,
        ppi: u32,
    ) -> Self {
        let units = match card.width.unit() {
            Unit::Inch => DxfUnits::Inches,
            Unit::Millimeter | Unit::Raw => DxfUnits::Millimeters,
        };
        let (width, height) = if orientation.swaps_axes() {
            (card.height, card.width)
        } else {
            (card.width, card.height)
        };
        let length = |d: crate::units::Dimension| match units {
            DxfUnits::Millimeters => d.to_mm(ppi),
            DxfUnits::Inches => d.to_inches(ppi),
        };
        let origins = grid
            .cell_positions()
            .map(|(x, y)| (units.from_px(x, ppi), units.from_px(y, ppi)))
            .collect();

        Self {
            name: name.into(),
            units,
            card_width: length(width),
            card_height: length(height),
            radius: length(card.radius),
            origins,
        }
    }

    /// Render the whole template as an ASCII DXF document.
    pub fn to_dxf(&self) -> String {
        let mut out = String::new();
        group(&mut out, 0, "SECTION");
        group(&mut out, 2, "HEADER");
        group(&mut out, 9, "$ACADVER");
        group(&mut out, 1, "AC1009");
        group(&mut out, 9, "$INSUNITS");
        group(&mut out, 70, self.units.insunits());
        group(&mut out, 0, "ENDSEC");

        group(&mut out, 0, "SECTION");
        group(&mut out, 2, "ENTITIES");
        for &(x, y) in &self.origins {
            emit_rounded_rect(
                &mut out,
                x,
                y,
                self.card_width,
                self.card_height,
                self.radius,
            );
        }
        group(&mut out, 0, "ENDSEC");
        group(&mut out, 0, "EOF");
        out
    }

    /// Write `{dir}/{name}.dxf` and return its path.
    #[cfg(feature = "std")]
    pub fn write_to(&self, dir: impl AsRef<std::path::Path>) -> std::io::Result<std::path::PathBuf> {
        let path = dir.as_ref().join(format!("{}.dxf", self.name));
        std::fs::write(&path, self.to_dxf())?;
        tracing::info!(path = %path.display(), outlines = self.origins.len(), "wrote cut template");
        Ok(path)
    }
}

/// Append one rounded rectangle spanning `(x, y)` to `(x + w, y + h)`.
pub fn emit_rounded_rect(out: &mut String, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let bl = (x + r, y + r);
    let br = (x + w - r, y + r);
    let tr = (x + w - r, y + h - r);
    let tl = (x + r, y + h - r);

    line(out, (bl.0, y), (br.0, y));
    line(out, (x + w, br.1), (x + w, tr.1));
    line(out, (tr.0, y + h), (tl.0, y + h));
    line(out, (x, tl.1), (x, bl.1));

    if r > 0.0 {
        arc(out, br, r, 270.0, 360.0);
        arc(out, tr, r, 0.0, 90.0);
        arc(out, tl, r, 90.0, 180.0);
        arc(out, bl, r, 180.0, 270.0);
    }
}

fn line(out: &mut String, from: (f64, f64), to: (f64, f64)) {
    group(out, 0, "LINE");
    group(out, 8, "0");
    group(out, 10, from.0);
    group(out, 20, from.1);
    group(out, 30, 0.0);
    group(out, 11, to.0);
    group(out, 21, to.1);
    group(out, 31, 0.0);
}

fn arc(out: &mut String, center: (f64, f64), r: f64, start: f64, end: f64) {
    group(out, 0, "ARC");
    group(out, 8, "0");
    group(out, 10, center.0);
    group(out, 20, center.1);
    group(out, 30, 0.0);
    group(out, 40, r);
    group(out, 50, start);
    group(out, 51, end);
}

fn group(out: &mut String, code: u16, value: impl core::fmt::Display) {
    out.push_str(&format!("{code}\n{value}\n"));
}

//! Registration mark geometry for a sheet.
//!
//! Coordinates are millimeters with the origin at the bottom-left corner of
//! the paper and y pointing up, the way cutters read the sheet. The marks
//! are a filled square near the top-left corner and two L-shaped corners,
//! one at the bottom-left and one mirrored at the top-right.

use crate::solver::{PaperSpec, RegistrationMarks};

/// Edge length of the filled corner square.
pub const SQUARE_MM: f64 = 5.0;

/// Axis-aligned rectangle, bottom-left anchored.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarkRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Straight stroke between two points.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarkLine {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// Registration marks resolved against one paper size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarkSheet {
    pub paper_width_mm: f64,
    pub paper_height_mm: f64,
    pub inset_mm: f64,
    pub thickness_mm: f64,
    pub length_mm: f64,
    /// Resolution of the rendered sheet.
    pub ppi: u32,
    /// Paper size in pixels at `ppi`, rounded up.
    pub canvas_px: (u32, u32),
}

impl MarkSheet {
    pub fn new(paper: &PaperSpec, marks: &RegistrationMarks, ppi: u32) -> Self {
        Self {
            paper_width_mm: paper.width.to_mm(ppi),
            paper_height_mm: paper.height.to_mm(ppi),
            inset_mm: marks.inset.to_mm(ppi),
            thickness_mm: marks.thickness.to_mm(ppi),
            length_mm: marks.length.to_mm(ppi),
            ppi,
            canvas_px: (paper.width.to_px(ppi), paper.height.to_px(ppi)),
        }
    }

    /// Stroke width in PostScript points.
    pub fn thickness_pt(&self) -> f64 {
        self.thickness_mm / crate::units::MM_PER_INCH * crate::units::POINTS_PER_INCH
    }

    /// The filled square, top-left corner.
    pub fn square(&self) -> MarkRect {
        MarkRect {
            x: self.inset_mm,
            y: self.paper_height_mm - self.inset_mm - SQUARE_MM,
            width: SQUARE_MM,
            height: SQUARE_MM,
        }
    }

    /// The four arms: bottom-left horizontal and vertical, then top-right
    /// horizontal and vertical. Arms stop half a stroke short so the line
    /// caps end at `length`.
    pub fn lines(&self) -> [MarkLine; 4] {
        let arm = self.length_mm - self.thickness_mm / 2.0;
        let near = self.inset_mm;
        let far_x = self.paper_width_mm - self.inset_mm;
        let far_y = self.paper_height_mm - self.inset_mm;
        [
            MarkLine {
                from: (near, near),
                to: (near + arm, near),
            },
            MarkLine {
                from: (near, near),
                to: (near, near + arm),
            },
            MarkLine {
                from: (far_x - arm, far_y),
                to: (far_x, far_y),
            },
            MarkLine {
                from: (far_x, far_y),
                to: (far_x, far_y - arm),
            },
        ]
    }
}

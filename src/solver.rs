//! Grid packing of rounded-rectangle cards onto a paper sheet.
//!
//! Computes how many cards fit, where each one goes in device pixels, and
//! how leftover space is split into bleed (gaps between cards), outer space
//! (clearance past the margin) and margin (room for registration marks).
//! Pure arithmetic over immutable inputs.
//!
//! # Example
//!
//! ```
//! use cardsheet::units::Dimension;
//! use cardsheet::{CardSpec, Orientation, PaperSpec, RegistrationMarks, SpacingPolicy, solve};
//!
//! let card = CardSpec::new(Dimension::mm(63.0), Dimension::mm(88.0), Dimension::mm(3.0));
//! let paper = PaperSpec::new(Dimension::mm(210.0), Dimension::mm(297.0));
//! let marks = RegistrationMarks::new(Dimension::mm(10.0), Dimension::mm(0.5), Dimension::mm(5.0));
//!
//! let grid = solve(&card, &paper, Orientation::Vertical, 300, &SpacingPolicy::new(marks)).unwrap();
//! assert_eq!((grid.cols, grid.rows), (3, 3));
//! assert_eq!(grid.cell_positions().count(), 9);
//! ```

use alloc::vec::Vec;
use core::fmt;

use num_traits::Float;

use crate::units::Dimension;

/// Physical footprint of one card before orientation is applied.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Deserialize))]
pub struct CardSpec {
    pub width: Dimension,
    pub height: Dimension,
    /// Corner radius of the cut outline.
    pub radius: Dimension,
}

impl CardSpec {
    pub const fn new(width: Dimension, height: Dimension, radius: Dimension) -> Self {
        Self {
            width,
            height,
            radius,
        }
    }

    /// Whether the corner radius leaves a valid rounded rectangle:
    /// `radius <= min(width, height) / 2`.
    pub fn radius_fits(&self, ppi: u32) -> bool {
        let shortest = self.width.to_mm(ppi).min(self.height.to_mm(ppi));
        self.radius.to_mm(ppi) <= shortest / 2.0
    }
}

/// Physical sheet footprint.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Deserialize))]
pub struct PaperSpec {
    pub width: Dimension,
    pub height: Dimension,
}

impl PaperSpec {
    pub const fn new(width: Dimension, height: Dimension) -> Self {
        Self { width, height }
    }
}

/// Which way cards are packed on the sheet.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Cards as specified.
    #[default]
    Vertical,
    /// Cards rotated 90°: width and height are swapped before packing.
    Horizontal,
}

impl Orientation {
    /// Lowercase name used in template file names.
    pub const fn label(self) -> &'static str {
        match self {
            Orientation::Vertical => "vertical",
            Orientation::Horizontal => "horizontal",
        }
    }

    pub const fn swaps_axes(self) -> bool {
        matches!(self, Orientation::Horizontal)
    }
}

/// Registration mark geometry the sheet margin has to clear.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "std", derive(serde::Deserialize))]
pub struct RegistrationMarks {
    /// Distance from the paper edge to the marks.
    pub inset: Dimension,
    /// Stroke thickness of the mark lines.
    pub thickness: Dimension,
    /// Arm length of the L-shaped corner marks.
    pub length: Dimension,
}

impl RegistrationMarks {
    pub const fn new(inset: Dimension, thickness: Dimension, length: Dimension) -> Self {
        Self {
            inset,
            thickness,
            length,
        }
    }

    /// Hard floor: cards may come up to the inset but no closer to the edge.
    pub fn min_margin_px(&self, ppi: u32) -> u64 {
        u64::from(self.inset.to_px(ppi))
    }

    /// Comfortable margin clearing the full mark: inset + arm length + half the stroke.
    pub fn relaxed_margin_px(&self, ppi: u32) -> u64 {
        u64::from(self.inset.to_px(ppi))
            + u64::from(self.length.to_px(ppi))
            + u64::from(self.thickness.to_px(ppi) / 2)
    }
}

/// How leftover sheet space is allocated.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpacingPolicy {
    /// Preferred gap between adjacent cards.
    pub bleed: Dimension,
    /// Preferred clearance between the margin and the outermost cards.
    pub outer_space: Dimension,
    pub marks: RegistrationMarks,
}

impl SpacingPolicy {
    /// Default bleed between cards.
    pub const DEFAULT_BLEED: Dimension = Dimension::mm(1.0);
    /// Default clearance between the margin and the cards.
    pub const DEFAULT_OUTER_SPACE: Dimension = Dimension::mm(2.0);

    /// Policy with default bleed and outer space.
    pub const fn new(marks: RegistrationMarks) -> Self {
        Self {
            bleed: Self::DEFAULT_BLEED,
            outer_space: Self::DEFAULT_OUTER_SPACE,
            marks,
        }
    }

    pub const fn bleed(mut self, bleed: Dimension) -> Self {
        self.bleed = bleed;
        self
    }

    pub const fn outer_space(mut self, outer_space: Dimension) -> Self {
        self.outer_space = outer_space;
        self
    }
}

/// Which axes had their margin lowered from the relaxed margin to the floor.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MarginRelaxation {
    /// Both axes keep the relaxed margin.
    #[default]
    None,
    /// Left and right margins dropped to the floor.
    Horizontal,
    /// Top and bottom margins dropped to the floor.
    Vertical,
    /// Both axes dropped to the floor.
    Both,
}

impl MarginRelaxation {
    fn from_axes(x: bool, y: bool) -> Self {
        match (x, y) {
            (false, false) => Self::None,
            (true, false) => Self::Horizontal,
            (false, true) => Self::Vertical,
            (true, true) => Self::Both,
        }
    }
}

/// Result of [`solve`]: card placements and the resolved spacing, in pixels.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayoutGrid {
    pub rows: u32,
    pub cols: u32,
    /// Card footprint after orientation.
    pub card_width_px: u32,
    pub card_height_px: u32,
    pub paper_width_px: u32,
    pub paper_height_px: u32,
    /// Left edge of each column.
    pub x_positions: Vec<u32>,
    /// Top edge of each row.
    pub y_positions: Vec<u32>,
    pub margin_x: u32,
    pub margin_y: u32,
    pub bleed_x: u32,
    pub bleed_y: u32,
    pub space_x: u32,
    pub space_y: u32,
    pub relaxation: MarginRelaxation,
}

impl LayoutGrid {
    pub fn card_count(&self) -> u64 {
        u64::from(self.rows) * u64::from(self.cols)
    }

    /// True when not even one card fits.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Top-left corner of the card at `(col, row)`.
    pub fn cell(&self, col: u32, row: u32) -> Option<(u32, u32)> {
        let x = self.x_positions.get(col as usize)?;
        let y = self.y_positions.get(row as usize)?;
        Some((*x, *y))
    }

    /// Top-left corners of every card, row by row.
    pub fn cell_positions(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.y_positions
            .iter()
            .flat_map(move |&y| self.x_positions.iter().map(move |&x| (x, y)))
    }
}

/// Layout computation error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// Resolution is zero.
    ZeroResolution,
    /// Card width or height is zero pixels.
    ZeroCardDimension,
    /// Paper width or height is zero pixels.
    ZeroPaperDimension,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayoutError::ZeroResolution => "resolution must be at least 1 ppi",
            LayoutError::ZeroCardDimension => "card width and height must be positive",
            LayoutError::ZeroPaperDimension => "paper width and height must be positive",
        })
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LayoutError {}

/// Pack as many cards as fit onto the sheet.
///
/// A card larger than the usable paper is not an error: the grid comes
/// back with zero rows or columns and no positions.
pub fn solve(
    card: &CardSpec,
    paper: &PaperSpec,
    orientation: Orientation,
    ppi: u32,
    policy: &SpacingPolicy,
) -> Result<LayoutGrid, LayoutError> {
    if ppi == 0 {
        return Err(LayoutError::ZeroResolution);
    }

    let paper_w = paper.width.to_px(ppi);
    let paper_h = paper.height.to_px(ppi);
    if paper_w == 0 || paper_h == 0 {
        return Err(LayoutError::ZeroPaperDimension);
    }

    let (card_w, card_h) = match orientation {
        Orientation::Vertical => (card.width.to_px(ppi), card.height.to_px(ppi)),
        Orientation::Horizontal => (card.height.to_px(ppi), card.width.to_px(ppi)),
    };
    if card_w == 0 || card_h == 0 {
        return Err(LayoutError::ZeroCardDimension);
    }

    let margins = Margins {
        relaxed: policy.marks.relaxed_margin_px(ppi) as i64,
        floor: policy.marks.min_margin_px(ppi) as i64,
    };
    let bleed = policy.bleed.to_px(ppi) as i64;
    let space = policy.outer_space.to_px(ppi) as i64;

    let x = AxisFit::new(paper_w, card_w, margins);
    let y = AxisFit::new(paper_h, card_h, margins);

    let (x_plan, y_plan) = relax_margins(&x, &y, space, bleed);
    let relaxation = MarginRelaxation::from_axes(
        x_plan.margin != margins.relaxed,
        y_plan.margin != margins.relaxed,
    );
    tracing::debug!(
        cols = x_plan.count,
        max_cols = x.max_count,
        rows = y_plan.count,
        max_rows = y.max_count,
        ?relaxation,
        "margin relaxation"
    );

    let x_plan = x_plan.shrink_to_fit();
    let y_plan = y_plan.shrink_to_fit();
    tracing::trace!(
        bleed_x = x_plan.bleed,
        space_x = x_plan.space,
        bleed_y = y_plan.bleed,
        space_y = y_plan.space,
        "spacing after shrink"
    );

    Ok(LayoutGrid {
        rows: y_plan.count,
        cols: x_plan.count,
        card_width_px: card_w,
        card_height_px: card_h,
        paper_width_px: paper_w,
        paper_height_px: paper_h,
        x_positions: x_plan.positions(),
        y_positions: y_plan.positions(),
        margin_x: saturate_px(x_plan.margin),
        margin_y: saturate_px(y_plan.margin),
        bleed_x: saturate_px(x_plan.bleed),
        bleed_y: saturate_px(y_plan.bleed),
        space_x: saturate_px(x_plan.space),
        space_y: saturate_px(y_plan.space),
        relaxation,
    })
}

// ============================================================================
// Per-axis state
// ============================================================================

#[derive(Copy, Clone, Debug)]
struct Margins {
    relaxed: i64,
    floor: i64,
}

/// Card counts along one axis under both margin regimes.
#[derive(Copy, Clone, Debug)]
struct AxisFit {
    card: i64,
    margins: Margins,
    relaxed_available: i64,
    floor_available: i64,
    count: u32,
    max_count: u32,
}

impl AxisFit {
    fn new(paper: u32, card: u32, margins: Margins) -> Self {
        let card = card as i64;
        let relaxed_available = paper as i64 - 2 * margins.relaxed;
        let floor_available = paper as i64 - 2 * margins.floor;
        Self {
            card,
            margins,
            relaxed_available,
            floor_available,
            count: fit_count(relaxed_available, card),
            max_count: fit_count(floor_available, card),
        }
    }

    fn has_slack(&self) -> bool {
        self.count < self.max_count
    }

    /// Plan at the relaxed margin with full spacing.
    fn relaxed(&self, space: i64, bleed: i64) -> AxisPlan {
        AxisPlan {
            count: self.count,
            card: self.card,
            margin: self.margins.relaxed,
            available: self.relaxed_available,
            space,
            bleed,
        }
    }
}

/// Resolved spacing along one axis. Every transition returns a new value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct AxisPlan {
    count: u32,
    card: i64,
    margin: i64,
    available: i64,
    space: i64,
    bleed: i64,
}

impl AxisPlan {
    /// Extent of the packed block including outer space on both sides.
    fn filled(&self) -> i64 {
        let count = self.count as i64;
        let gaps = (count - 1).max(0);
        self.card * count + 2 * self.space + self.bleed * gaps
    }

    /// Switch to the floor margin and pack the maximum count, without outer space.
    fn relax_to_floor(self, fit: &AxisFit) -> Self {
        Self {
            count: fit.max_count,
            margin: fit.margins.floor,
            available: fit.floor_available,
            space: 0,
            ..self
        }
    }

    /// Switch to the floor margin, keeping count and spacing.
    fn with_floor_margin(self, fit: &AxisFit) -> Self {
        Self {
            margin: fit.margins.floor,
            available: fit.floor_available,
            ..self
        }
    }

    /// Drain outer space, then bleed, one pixel at a time until the block fits.
    fn shrink_to_fit(self) -> Self {
        let mut plan = self;
        while plan.filled() > plan.available {
            if plan.space > 0 {
                plan.space -= 1;
            } else if plan.bleed > 0 {
                plan.bleed -= 1;
            } else {
                break;
            }
        }
        plan
    }

    /// Leading edge of the first card, centering the block in the available span.
    fn start(&self) -> i64 {
        let leftover = (self.available - self.filled()) as f64 / 2.0;
        Float::floor(self.margin as f64 + self.space as f64 + leftover) as i64
    }

    fn positions(&self) -> Vec<u32> {
        let start = self.start();
        let pitch = self.card + self.bleed;
        (0..self.count as i64)
            .map(|i| saturate_px(start + i * pitch))
            .collect()
    }
}

/// Pick which axes drop to the floor margin.
fn relax_margins(x: &AxisFit, y: &AxisFit, space: i64, bleed: i64) -> (AxisPlan, AxisPlan) {
    let x_plan = x.relaxed(space, bleed);
    let y_plan = y.relaxed(space, bleed);

    match (x.has_slack(), y.has_slack()) {
        (true, true) => {
            // Only one axis is expanded: the one whose block overshoots its
            // relaxed span the most.
            let x_excess = x_plan.filled() - x_plan.available;
            let y_excess = y_plan.filled() - y_plan.available;
            if y_excess > x_excess {
                (x_plan, y_plan.relax_to_floor(y))
            } else {
                (x_plan.relax_to_floor(x), y_plan)
            }
        }
        (true, false) => (x_plan.relax_to_floor(x), y_plan),
        (false, true) => (x_plan, y_plan.relax_to_floor(y)),
        (false, false) => {
            // Neither axis gains a card. Each check looks at the other axis's
            // leftover, and both may fire, unlike the branch above.
            let y_plan = if 2 * x_plan.bleed < x_plan.available - x_plan.filled() {
                y_plan.with_floor_margin(y)
            } else {
                y_plan
            };
            let x_plan = if 2 * y_plan.bleed < y_plan.available - y_plan.filled() {
                x_plan.with_floor_margin(x)
            } else {
                x_plan
            };
            (x_plan, y_plan)
        }
    }
}

fn saturate_px(v: i64) -> u32 {
    v.clamp(0, i64::from(u32::MAX)) as u32
}

fn fit_count(available: i64, card: i64) -> u32 {
    if available <= 0 {
        0
    } else {
        (available / card) as u32
    }
}

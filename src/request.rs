//! Layout requests: preset resolution, overrides, and result packaging.
//!
//! A request names a card size and a paper size from a [`Presets`] table,
//! or `"custom"` with explicit dimensions. Unset spacing and resolution
//! fields fall back to the table's defaults.
//!
//! ```
//! use cardsheet::{LayoutRequest, Presets, generate_layout};
//!
//! let presets = Presets::builtin().unwrap();
//! let result = generate_layout(&presets, &LayoutRequest::new("poker", "a4")).unwrap();
//!
//! assert_eq!((result.grid.cols, result.grid.rows), (3, 3));
//! assert_eq!(result.template_name, "a4_poker_vertical_3x3");
//! ```

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::config::{ConfigError, Presets};
use crate::dxf::CutTemplate;
use crate::marks::MarkSheet;
use crate::solver::{
    CardSpec, LayoutError, LayoutGrid, Orientation, PaperSpec, RegistrationMarks, SpacingPolicy,
    solve,
};
use crate::units::{Dimension, ParseError};

/// Size name that selects explicit dimensions instead of a preset.
pub const CUSTOM: &str = "custom";

/// Per-request values that take precedence over the preset table.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct Overrides {
    pub card_width: Option<Dimension>,
    pub card_height: Option<Dimension>,
    pub card_radius: Option<Dimension>,
    pub paper_width: Option<Dimension>,
    pub paper_height: Option<Dimension>,
    pub inset: Option<Dimension>,
    pub thickness: Option<Dimension>,
    pub length: Option<Dimension>,
    pub bleed: Option<Dimension>,
    pub outer_space: Option<Dimension>,
    pub ppi: Option<u32>,
    /// Text each size was set from, next to the value it parsed to.
    literals: BTreeMap<&'static str, (Dimension, String)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one field from its textual form, e.g. `("card_width", "63mm")`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), RequestError> {
        if key == "ppi" {
            let ppi = value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|&v| v > 0)
                .ok_or_else(|| ValidationError::InvalidResolution(value.to_string()))?;
            self.ppi = Some(ppi);
            return Ok(());
        }

        let (name, slot) = match key {
            "card_width" => ("card_width", &mut self.card_width),
            "card_height" => ("card_height", &mut self.card_height),
            "card_radius" => ("card_radius", &mut self.card_radius),
            "paper_width" => ("paper_width", &mut self.paper_width),
            "paper_height" => ("paper_height", &mut self.paper_height),
            "inset" => ("inset", &mut self.inset),
            "thickness" => ("thickness", &mut self.thickness),
            "length" => ("length", &mut self.length),
            "bleed" => ("bleed", &mut self.bleed),
            "outer_space" => ("outer_space", &mut self.outer_space),
            _ => return Err(ValidationError::UnknownOverride(key.to_string()).into()),
        };
        let size = Dimension::parse(value)?;
        *slot = Some(size);
        self.literals.insert(name, (size, value.trim().to_string()));
        Ok(())
    }

    /// The text `key` was set from, or `size` formatted when the field was
    /// assigned directly since.
    fn literal(&self, key: &str, size: Dimension) -> String {
        match self.literals.get(key) {
            Some((parsed, text)) if *parsed == size => text.clone(),
            _ => size.to_string(),
        }
    }

    fn marks(&self, defaults: &RegistrationMarks) -> RegistrationMarks {
        RegistrationMarks {
            inset: self.inset.unwrap_or(defaults.inset),
            thickness: self.thickness.unwrap_or(defaults.thickness),
            length: self.length.unwrap_or(defaults.length),
        }
    }
}

/// What to lay out.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutRequest {
    /// Card preset name, or [`CUSTOM`].
    pub card_size: String,
    /// Paper preset name, or [`CUSTOM`].
    pub paper_size: String,
    pub orientation: Orientation,
    pub overrides: Overrides,
}

impl LayoutRequest {
    pub fn new(card_size: impl Into<String>, paper_size: impl Into<String>) -> Self {
        Self {
            card_size: card_size.into(),
            paper_size: paper_size.into(),
            orientation: Orientation::Vertical,
            overrides: Overrides::default(),
        }
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Rotate cards 90° on the sheet.
    pub fn horizontal(self) -> Self {
        self.orientation(Orientation::Horizontal)
    }

    /// Use a custom card size.
    pub fn custom_card(mut self, width: Dimension, height: Dimension, radius: Dimension) -> Self {
        self.card_size = CUSTOM.into();
        self.overrides.card_width = Some(width);
        self.overrides.card_height = Some(height);
        self.overrides.card_radius = Some(radius);
        self
    }

    /// Use a custom paper size.
    pub fn custom_paper(mut self, width: Dimension, height: Dimension) -> Self {
        self.paper_size = CUSTOM.into();
        self.overrides.paper_width = Some(width);
        self.overrides.paper_height = Some(height);
        self
    }

    pub fn marks(mut self, inset: Dimension, thickness: Dimension, length: Dimension) -> Self {
        self.overrides.inset = Some(inset);
        self.overrides.thickness = Some(thickness);
        self.overrides.length = Some(length);
        self
    }

    pub fn bleed(mut self, bleed: Dimension) -> Self {
        self.overrides.bleed = Some(bleed);
        self
    }

    pub fn outer_space(mut self, outer_space: Dimension) -> Self {
        self.overrides.outer_space = Some(outer_space);
        self
    }

    pub fn ppi(mut self, ppi: u32) -> Self {
        self.overrides.ppi = Some(ppi);
        self
    }

    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A request with every preset and default filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedLayout {
    pub card_size: String,
    pub paper_size: String,
    /// `{name}` for presets, `custom({w}x{h}R{r})` for a custom card.
    pub card_label: String,
    /// `{name}` for presets, `custom({w}x{h})` for custom paper.
    pub paper_label: String,
    pub card: CardSpec,
    pub paper: PaperSpec,
    pub policy: SpacingPolicy,
    pub orientation: Orientation,
    pub ppi: u32,
}

impl ResolvedLayout {
    /// Base name for output files: `{paper}_{card}_{orientation}_{cols}x{rows}`.
    pub fn template_name(&self, grid: &LayoutGrid) -> String {
        format!(
            "{}_{}_{}_{}x{}",
            self.paper_label,
            self.card_label,
            self.orientation.label(),
            grid.cols,
            grid.rows
        )
    }

    /// Registration marks for this paper and mark geometry.
    pub fn mark_sheet(&self) -> MarkSheet {
        MarkSheet::new(&self.paper, &self.policy.marks, self.ppi)
    }
}

/// Solver output packaged for renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResult {
    pub resolved: ResolvedLayout,
    pub grid: LayoutGrid,
    pub template_name: String,
}

impl LayoutResult {
    /// DXF outlines for every placed card.
    pub fn cut_template(&self) -> CutTemplate {
        CutTemplate::from_grid(
            self.template_name.clone(),
            &self.resolved.card,
            self.resolved.orientation,
            &self.grid,
            self.resolved.ppi,
        )
    }

    /// Summary consumed by downstream renderers:
    /// card pixel size plus column/row offsets keyed by paper and card name.
    #[cfg(feature = "std")]
    pub fn manifest(&self) -> serde_json::Value {
        let card = &self.resolved.card_size;
        let paper = &self.resolved.paper_size;
        serde_json::json!({
            "card_sizes": {
                card: {
                    "width": self.grid.card_width_px,
                    "height": self.grid.card_height_px,
                }
            },
            "paper_layouts": {
                paper: {
                    "width": self.grid.paper_width_px,
                    "height": self.grid.paper_height_px,
                    "card_layouts": {
                        card: {
                            "x_pos": self.grid.x_positions,
                            "y_pos": self.grid.y_positions,
                            "template": self.template_name,
                        }
                    }
                }
            }
        })
    }
}

/// Fill in presets and defaults for `request`.
pub fn resolve_layout(
    presets: &Presets,
    request: &LayoutRequest,
) -> Result<ResolvedLayout, RequestError> {
    let o = &request.overrides;

    let (card, card_label) = if request.card_size == CUSTOM {
        match (o.card_width, o.card_height, o.card_radius) {
            (Some(width), Some(height), Some(radius)) => {
                let label = format!(
                    "{CUSTOM}({}x{}R{})",
                    o.literal("card_width", width),
                    o.literal("card_height", height),
                    o.literal("card_radius", radius)
                );
                (CardSpec::new(width, height, radius), label)
            }
            _ => {
                let missing = missing_fields(&[
                    ("card_width", o.card_width.is_none()),
                    ("card_height", o.card_height.is_none()),
                    ("card_radius", o.card_radius.is_none()),
                ]);
                return Err(ValidationError::MissingCustomCard { missing }.into());
            }
        }
    } else {
        (*presets.card(&request.card_size)?, request.card_size.clone())
    };

    let (paper, paper_label) = resolve_paper(presets, &request.paper_size, o)?;

    let ppi = o.ppi.unwrap_or(presets.ppi);
    let policy = SpacingPolicy::new(o.marks(&presets.silhouette))
        .bleed(o.bleed.unwrap_or(SpacingPolicy::DEFAULT_BLEED))
        .outer_space(o.outer_space.unwrap_or(SpacingPolicy::DEFAULT_OUTER_SPACE));

    tracing::debug!(
        card = %request.card_size,
        paper = %request.paper_size,
        ppi,
        orientation = request.orientation.label(),
        "resolved layout request"
    );

    Ok(ResolvedLayout {
        card_size: request.card_size.clone(),
        paper_size: request.paper_size.clone(),
        card_label,
        paper_label,
        card,
        paper,
        policy,
        orientation: request.orientation,
        ppi,
    })
}

/// Resolve and solve `request`.
pub fn generate_layout(
    presets: &Presets,
    request: &LayoutRequest,
) -> Result<LayoutResult, RequestError> {
    let resolved = resolve_layout(presets, request)?;
    let grid = solve(
        &resolved.card,
        &resolved.paper,
        resolved.orientation,
        resolved.ppi,
        &resolved.policy,
    )?;
    if grid.is_empty() {
        tracing::warn!(
            card = %resolved.card_label,
            paper = %resolved.paper_label,
            "card does not fit on the paper"
        );
    }
    let template_name = resolved.template_name(&grid);
    Ok(LayoutResult {
        resolved,
        grid,
        template_name,
    })
}

/// Registration marks for a paper preset (or [`CUSTOM`] paper), independent of any card.
pub fn resolve_mark_sheet(
    presets: &Presets,
    paper_size: &str,
    overrides: &Overrides,
) -> Result<MarkSheet, RequestError> {
    let (paper, _) = resolve_paper(presets, paper_size, overrides)?;
    let marks = overrides.marks(&presets.silhouette);
    Ok(MarkSheet::new(&paper, &marks, overrides.ppi.unwrap_or(presets.ppi)))
}

/// Paper dimensions and the label used in file names.
fn resolve_paper(
    presets: &Presets,
    paper_size: &str,
    o: &Overrides,
) -> Result<(PaperSpec, String), RequestError> {
    if paper_size == CUSTOM {
        match (o.paper_width, o.paper_height) {
            (Some(width), Some(height)) => {
                let label = format!(
                    "{CUSTOM}({}x{})",
                    o.literal("paper_width", width),
                    o.literal("paper_height", height)
                );
                Ok((PaperSpec::new(width, height), label))
            }
            _ => {
                let missing = missing_fields(&[
                    ("paper_width", o.paper_width.is_none()),
                    ("paper_height", o.paper_height.is_none()),
                ]);
                Err(ValidationError::MissingCustomPaper { missing }.into())
            }
        }
    } else {
        Ok((*presets.paper(paper_size)?, paper_size.to_string()))
    }
}

fn missing_fields(fields: &[(&'static str, bool)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| *name)
        .collect()
}

/// A request that cannot be resolved as given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// `custom` card without all of width, height and radius.
    MissingCustomCard { missing: Vec<&'static str> },
    /// `custom` paper without both width and height.
    MissingCustomPaper { missing: Vec<&'static str> },
    /// Override key not recognized by [`Overrides::set`].
    UnknownOverride(String),
    /// Resolution is not a positive integer.
    InvalidResolution(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingCustomCard { missing } => {
                write!(f, "custom card size requires {}", missing.join(", "))
            }
            ValidationError::MissingCustomPaper { missing } => {
                write!(f, "custom paper size requires {}", missing.join(", "))
            }
            ValidationError::UnknownOverride(key) => write!(f, "unknown override {key:?}"),
            ValidationError::InvalidResolution(value) => {
                write!(f, "resolution {value:?} must be a positive integer")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ValidationError {}

/// Any failure while turning a request into a layout.
#[derive(Debug)]
pub enum RequestError {
    Config(ConfigError),
    Validation(ValidationError),
    Parse(ParseError),
    Layout(LayoutError),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Config(e) => fmt::Display::fmt(e, f),
            RequestError::Validation(e) => fmt::Display::fmt(e, f),
            RequestError::Parse(e) => fmt::Display::fmt(e, f),
            RequestError::Layout(e) => fmt::Display::fmt(e, f),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Config(e) => Some(e),
            RequestError::Validation(e) => Some(e),
            RequestError::Parse(e) => Some(e),
            RequestError::Layout(e) => Some(e),
        }
    }
}

impl From<ConfigError> for RequestError {
    fn from(e: ConfigError) -> Self {
        RequestError::Config(e)
    }
}

impl From<ValidationError> for RequestError {
    fn from(e: ValidationError) -> Self {
        RequestError::Validation(e)
    }
}

impl From<ParseError> for RequestError {
    fn from(e: ParseError) -> Self {
        RequestError::Parse(e)
    }
}

impl From<LayoutError> for RequestError {
    fn from(e: LayoutError) -> Self {
        RequestError::Layout(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn mm(v: f64) -> Dimension {
        Dimension::mm(v)
    }

    fn presets() -> Presets {
        Presets::new(300, RegistrationMarks::new(mm(10.0), mm(0.5), mm(5.0)))
            .with_card("poker", CardSpec::new(mm(63.0), mm(88.0), mm(3.0)))
            .with_paper("a4", PaperSpec::new(mm(210.0), mm(297.0)))
    }

    #[test]
    fn preset_request_uses_defaults() {
        let resolved = resolve_layout(&presets(), &LayoutRequest::new("poker", "a4")).unwrap();
        assert_eq!(resolved.ppi, 300);
        assert_eq!(resolved.card.height, mm(88.0));
        assert_eq!(resolved.policy.bleed, mm(1.0));
        assert_eq!(resolved.policy.outer_space, mm(2.0));
        assert_eq!(resolved.policy.marks.inset, mm(10.0));
    }

    #[test]
    fn overrides_replace_individual_fields() {
        let mut o = Overrides::new();
        o.set("thickness", "1mm").unwrap();
        o.set("bleed", "0.5mm").unwrap();
        o.set("ppi", "600").unwrap();
        let req = LayoutRequest::new("poker", "a4").overrides(o);
        let resolved = resolve_layout(&presets(), &req).unwrap();
        assert_eq!(resolved.ppi, 600);
        assert_eq!(resolved.policy.bleed, mm(0.5));
        assert_eq!(resolved.policy.outer_space, mm(2.0));
        assert_eq!(resolved.policy.marks.thickness, mm(1.0));
        assert_eq!(resolved.policy.marks.inset, mm(10.0));
        assert_eq!(resolved.policy.marks.length, mm(5.0));
    }

    #[test]
    fn override_errors() {
        let mut o = Overrides::new();
        assert!(matches!(
            o.set("card_width", "63cm"),
            Err(RequestError::Parse(ParseError::Malformed(_)))
        ));
        assert!(matches!(
            o.set("gutter", "1mm"),
            Err(RequestError::Validation(ValidationError::UnknownOverride(_)))
        ));
        assert!(matches!(
            o.set("ppi", "0"),
            Err(RequestError::Validation(ValidationError::InvalidResolution(_)))
        ));
        assert_eq!(o, Overrides::default());
    }

    #[test]
    fn custom_card_requires_all_dimensions() {
        let mut req = LayoutRequest::new(CUSTOM, "a4");
        req.overrides.card_width = Some(mm(50.0));
        let err = resolve_layout(&presets(), &req).unwrap_err();
        match err {
            RequestError::Validation(ValidationError::MissingCustomCard { missing }) => {
                assert_eq!(missing, vec!["card_height", "card_radius"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn custom_paper_requires_both_dimensions() {
        let mut req = LayoutRequest::new("poker", CUSTOM);
        req.overrides.paper_height = Some(mm(300.0));
        let err = resolve_layout(&presets(), &req).unwrap_err();
        assert_eq!(err.to_string(), "custom paper size requires paper_width");
    }

    #[test]
    fn unknown_preset_lists_names() {
        let err = resolve_layout(&presets(), &LayoutRequest::new("tarot", "a4")).unwrap_err();
        assert!(matches!(
            &err,
            RequestError::Config(ConfigError::UnknownCardSize { valid, .. }) if valid == &["poker"]
        ));
        let err = resolve_layout(&presets(), &LayoutRequest::new("poker", "a5")).unwrap_err();
        assert!(matches!(err, RequestError::Config(ConfigError::UnknownPaperSize { .. })));
    }

    #[test]
    fn preset_template_name() {
        let result = generate_layout(&presets(), &LayoutRequest::new("poker", "a4")).unwrap();
        assert_eq!(result.template_name, "a4_poker_vertical_3x3");
    }

    #[test]
    fn custom_template_name_keeps_literal_sizes() {
        let req = LayoutRequest::new("", "")
            .custom_card(mm(63.0), mm(88.0), mm(3.0))
            .custom_paper(mm(210.0), mm(297.0));
        let result = generate_layout(&presets(), &req).unwrap();
        assert_eq!(
            result.template_name,
            "custom(210mmx297mm)_custom(63mmx88mmR3mm)_vertical_3x3"
        );
    }

    #[test]
    fn custom_names_keep_override_text() {
        let mut o = Overrides::new();
        o.set("card_width", " 63.0mm").unwrap();
        o.set("card_height", "88.00mm").unwrap();
        o.set("card_radius", ".5mm").unwrap();
        o.set("paper_width", "210.mm").unwrap();
        o.set("paper_height", "297mm").unwrap();
        let req = LayoutRequest::new(CUSTOM, CUSTOM).overrides(o);
        let result = generate_layout(&presets(), &req).unwrap();
        assert_eq!(result.resolved.card.width, mm(63.0));
        assert_eq!(
            result.template_name,
            "custom(210.mmx297mm)_custom(63.0mmx88.00mmR.5mm)_vertical_3x3"
        );
    }

    #[test]
    fn reassigned_override_drops_stale_text() {
        let mut o = Overrides::new();
        o.set("card_width", "63.0mm").unwrap();
        o.set("card_height", "88.00mm").unwrap();
        o.set("card_radius", "3mm").unwrap();
        o.card_width = Some(mm(60.0));
        let req = LayoutRequest::new(CUSTOM, "a4").overrides(o);
        let resolved = resolve_layout(&presets(), &req).unwrap();
        assert_eq!(resolved.card_label, "custom(60mmx88.00mmR3mm)");
        assert_eq!(resolved.paper_label, "a4");
    }

    #[test]
    fn huge_raw_inset_is_an_empty_layout() {
        let mut o = Overrides::new();
        o.set("inset", "5000000000").unwrap();
        let req = LayoutRequest::new("poker", "a4").overrides(o);
        let result = generate_layout(&presets(), &req).unwrap();
        assert!(result.grid.is_empty());
        assert!(result.cut_template().origins.is_empty());
    }

    #[test]
    fn horizontal_label_and_grid() {
        let req = LayoutRequest::new("poker", "a4").horizontal();
        let result = generate_layout(&presets(), &req).unwrap();
        // 1040x745 cards: 2 columns, 4 rows.
        assert_eq!((result.grid.cols, result.grid.rows), (2, 4));
        assert_eq!(result.template_name, "a4_poker_horizontal_2x4");
    }

    #[test]
    fn oversized_card_is_an_empty_result() {
        let req = LayoutRequest::new("poker", CUSTOM).custom_paper(mm(50.0), mm(50.0));
        let result = generate_layout(&presets(), &req).unwrap();
        assert!(result.grid.is_empty());
        assert!(result.template_name.ends_with("_0x0"));
        assert!(result.cut_template().origins.is_empty());
    }

    #[test]
    fn zero_resolution_is_a_layout_error() {
        let mut req = LayoutRequest::new("poker", "a4");
        req.overrides.ppi = Some(0);
        let err = generate_layout(&presets(), &req).unwrap_err();
        assert!(matches!(err, RequestError::Layout(LayoutError::ZeroResolution)));
    }

    #[test]
    fn mark_sheet_uses_paper_and_overrides() {
        let mut o = Overrides::new();
        o.set("inset", "8mm").unwrap();
        let sheet = resolve_mark_sheet(&presets(), "a4", &o).unwrap();
        assert_eq!(sheet.inset_mm, 8.0);
        assert_eq!(sheet.length_mm, 5.0);
        assert_eq!(sheet.canvas_px, (2481, 3508));

        let err = resolve_mark_sheet(&presets(), CUSTOM, &o).unwrap_err();
        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::MissingCustomPaper { .. })
        ));
    }

    #[cfg(feature = "std")]
    #[test]
    fn manifest_shape() {
        let result = generate_layout(&presets(), &LayoutRequest::new("poker", "a4")).unwrap();
        let m = result.manifest();
        assert_eq!(m["card_sizes"]["poker"]["width"], 745);
        assert_eq!(m["card_sizes"]["poker"]["height"], 1040);
        let sheet = &m["paper_layouts"]["a4"];
        assert_eq!(sheet["width"], 2481);
        assert_eq!(sheet["height"], 3508);
        let layout = &sheet["card_layouts"]["poker"];
        assert_eq!(layout["x_pos"], serde_json::json!([119, 868, 1617]));
        assert_eq!(layout["y_pos"], serde_json::json!([182, 1234, 2286]));
        assert_eq!(layout["template"], "a4_poker_vertical_3x3");
    }
}

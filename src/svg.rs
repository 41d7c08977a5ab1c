//! SVG renderings of a sheet: layout preview and registration marks.
//!
//! The preview draws the paper, the margin envelope, the registration marks
//! and every placed card as a rounded rectangle, in device pixels. The mark
//! sheet is the printable registration-mark layer alone, in millimeters.
//!
//! # Example
//!
//! ```
//! use cardsheet::{LayoutRequest, Presets, generate_layout, svg::render_layout_svg};
//!
//! let presets = Presets::builtin().unwrap();
//! let result = generate_layout(&presets, &LayoutRequest::new("poker", "a4")).unwrap();
//!
//! let svg = render_layout_svg(&result);
//! assert_eq!(svg.matches(r#"class="card""#).count(), 9);
//! ```

use crate::marks::{MarkLine, MarkSheet};
use crate::request::LayoutResult;
use crate::units::MM_PER_INCH;

/// Height of the caption strip under the preview sheet, in sheet pixels per 1000.
const CAPTION_PER_MILLE: f64 = 40.0;

/// Render a preview of a computed layout.
pub fn render_layout_svg(result: &LayoutResult) -> String {
    let grid = &result.grid;
    let resolved = &result.resolved;
    let (pw, ph) = (grid.paper_width_px as f64, grid.paper_height_px as f64);
    let caption_h = ph * CAPTION_PER_MILLE / 1000.0;
    let px_per_mm = resolved.ppi as f64 / MM_PER_INCH;
    let radius = resolved.card.radius.to_mm(resolved.ppi) * px_per_mm;

    let mut svg = String::with_capacity(4096);

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.2}mm" height="{:.2}mm" viewBox="0 0 {} {:.1}">"#,
        pw / px_per_mm,
        (ph + caption_h) / px_per_mm,
        pw,
        ph + caption_h
    ));
    svg.push('\n');

    svg.push_str(
        r##"<style>
  text { font-family: "Consolas", "DejaVu Sans Mono", "Courier New", monospace; fill: #333; }
  .paper { fill: #fff; stroke: #999; stroke-width: 2; }
  .margin { fill: none; stroke: #6ba3d6; stroke-width: 2; stroke-dasharray: 12,6; }
  .card { fill: #e8e8e8; stroke: #2c6faa; stroke-width: 3; }
  .mark { stroke: #000; fill: none; }
  .mark-fill { fill: #000; }
</style>
"##,
    );

    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{pw}" height="{ph}" class="paper"/>"#
    ));
    svg.push('\n');

    let (mx, my) = (grid.margin_x as f64, grid.margin_y as f64);
    if pw > 2.0 * mx && ph > 2.0 * my {
        svg.push_str(&format!(
            r#"<rect x="{mx}" y="{my}" width="{}" height="{}" class="margin"/>"#,
            pw - 2.0 * mx,
            ph - 2.0 * my
        ));
        svg.push('\n');
    }

    // Marks are in millimeters, y up; the preview is in pixels, y down.
    let sheet = resolved.mark_sheet();
    push_marks(&mut svg, &sheet, px_per_mm, ph);

    for (x, y) in grid.cell_positions() {
        svg.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{}" height="{}" rx="{radius:.1}" class="card"/>"#,
            grid.card_width_px, grid.card_height_px
        ));
        svg.push('\n');
    }

    let caption = format!(
        "{}  {} cards  bleed {}x{}px  space {}x{}px  @{}ppi",
        result.template_name,
        grid.card_count(),
        grid.bleed_x,
        grid.bleed_y,
        grid.space_x,
        grid.space_y,
        resolved.ppi
    );
    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" font-size="{:.1}" text-anchor="middle">{}</text>"#,
        pw / 2.0,
        ph + caption_h * 0.7,
        caption_h * 0.5,
        escape_xml(&caption)
    ));
    svg.push('\n');

    svg.push_str("</svg>\n");
    svg
}

/// Render the registration marks alone, sized to the paper, in millimeters.
pub fn render_marks_svg(sheet: &MarkSheet) -> String {
    let (w, h) = (sheet.paper_width_mm, sheet.paper_height_mm);
    let mut svg = String::with_capacity(1024);

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}mm" height="{h}mm" viewBox="0 0 {w} {h}">"#
    ));
    svg.push('\n');
    svg.push_str(&format!(
        r##"<rect x="0" y="0" width="{w}" height="{h}" fill="#fff"/>"##
    ));
    svg.push('\n');
    svg.push_str("<style>\n  .mark { stroke: #000; fill: none; }\n  .mark-fill { fill: #000; }\n</style>\n");
    push_marks(&mut svg, sheet, 1.0, h);
    svg.push_str("</svg>\n");
    svg
}

/// Append the mark square and corner arms, scaled by `scale` and flipped into y-down space.
fn push_marks(svg: &mut String, sheet: &MarkSheet, scale: f64, page_h: f64) {
    let flip = |y_mm: f64| page_h - y_mm * scale;
    let stroke = sheet.thickness_mm * scale;

    let sq = sheet.square();
    svg.push_str(&format!(
        r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" class="mark-fill"/>"#,
        sq.x * scale,
        flip(sq.y + sq.height),
        sq.width * scale,
        sq.height * scale
    ));
    svg.push('\n');

    for MarkLine { from, to } in sheet.lines() {
        svg.push_str(&format!(
            r#"<line x1="{:.3}" y1="{:.3}" x2="{:.3}" y2="{:.3}" stroke-width="{stroke:.3}" class="mark"/>"#,
            from.0 * scale,
            flip(from.1),
            to.0 * scale,
            flip(to.1)
        ));
        svg.push('\n');
    }
}

/// Escape special characters for XML text content.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

use anyhow::{bail, Context, Result};

use crate::models::ChartData;

const CHART_WIDTH: u32 = 1000;
const CHART_HEIGHT: u32 = 600;
const CENTER_X: f64 = 500.0;
const CENTER_Y: f64 = 300.0;
const RADIUS: f64 = 220.0;
const START_ANGLE_DEG: f64 = 140.0;

/// Slice palette, cycled when there are more causes than colors.
const PALETTE: [&str; 6] = [
    "#3b85de", "#54a887", "#e39147", "#c9566b", "#8d6cc3", "#b0a135",
];

/// Renders the daily pie chart as PNG bytes. One slice per label/size
/// pair; empty chart data is a caller bug, not a drawable state.
pub fn render_png(data: &ChartData) -> Result<Vec<u8>> {
    if data.is_empty() {
        bail!("Chart data has no slices to draw");
    }

    let markup = svg_markup(data);
    rasterize(&markup, CHART_WIDTH, CHART_HEIGHT)
}

/// Builds the SVG document: pie slices with their category labels
/// around the rim and the percentage share inside each slice.
fn svg_markup(data: &ChartData) -> String {
    let total: u64 = data.sizes.iter().sum();
    let mut body = String::new();

    if data.sizes.len() == 1 {
        // A single slice degenerates the arc path, so draw the full disc.
        body.push_str(&format!(
            r#"<circle cx="{CENTER_X}" cy="{CENTER_Y}" r="{RADIUS}" fill="{}"/>"#,
            PALETTE[0]
        ));
        body.push('\n');
    }

    let mut angle = START_ANGLE_DEG.to_radians();
    for (index, (label, size)) in data.labels.iter().zip(&data.sizes).enumerate() {
        let fraction = *size as f64 / total as f64;
        let sweep = fraction * std::f64::consts::TAU;
        let end = angle + sweep;
        let color = PALETTE[index % PALETTE.len()];

        if data.sizes.len() > 1 {
            body.push_str(&slice_path(angle, end, sweep, color));
            body.push('\n');
        }

        let mid = angle + sweep / 2.0;
        body.push_str(&percentage_text(mid, fraction));
        body.push('\n');
        body.push_str(&label_text(mid, label));
        body.push('\n');

        angle = end;
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CHART_WIDTH}\" height=\"{CHART_HEIGHT}\" \
         viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n{body}</svg>"
    )
}

fn point_at(angle: f64, radius: f64) -> (f64, f64) {
    // Mathematical orientation: counterclockwise, y up.
    (
        CENTER_X + radius * angle.cos(),
        CENTER_Y - radius * angle.sin(),
    )
}

fn slice_path(start: f64, end: f64, sweep: f64, color: &str) -> String {
    let (x0, y0) = point_at(start, RADIUS);
    let (x1, y1) = point_at(end, RADIUS);
    let large_arc = i32::from(sweep > std::f64::consts::PI);

    format!(
        r##"<path d="M {CENTER_X:.2} {CENTER_Y:.2} L {x0:.2} {y0:.2} A {RADIUS} {RADIUS} 0 {large_arc} 0 {x1:.2} {y1:.2} Z" fill="{color}" stroke="#ffffff" stroke-width="1.5"/>"##
    )
}

fn percentage_text(mid_angle: f64, fraction: f64) -> String {
    let (x, y) = point_at(mid_angle, RADIUS * 0.6);
    format!(
        r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="22" text-anchor="middle" dominant-baseline="middle">{:.1}%</text>"#,
        fraction * 100.0
    )
}

fn label_text(mid_angle: f64, label: &str) -> String {
    let (x, y) = point_at(mid_angle, RADIUS * 1.12);
    let anchor = if mid_angle.cos() >= 0.0 { "start" } else { "end" };
    format!(
        r#"<text x="{x:.2}" y="{y:.2}" font-family="sans-serif" font-size="24" text-anchor="{anchor}" dominant-baseline="middle">{}</text>"#,
        escape_xml(label)
    )
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn rasterize(svg: &str, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_data(svg.as_bytes(), &options)
        .context("Failed to parse chart SVG markup")?;

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).context("Failed to allocate chart pixmap")?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder
        .write_header()
        .context("Failed to write chart PNG header")?
        .write_image_data(pixmap.data())
        .context("Failed to encode chart PNG")?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChartData {
        ChartData {
            labels: vec![
                "Correct Answers".to_string(),
                "timeout".to_string(),
                "Not specified".to_string(),
            ],
            sizes: vec![4, 2, 1],
        }
    }

    #[test]
    fn markup_contains_every_slice_and_label() {
        let markup = svg_markup(&sample());
        assert_eq!(markup.matches("<path ").count(), 3);
        assert!(markup.contains(">Correct Answers</text>"));
        assert!(markup.contains(">timeout</text>"));
        assert!(markup.contains(">Not specified</text>"));
        assert!(markup.contains(">57.1%</text>"));
        assert!(markup.contains(">28.6%</text>"));
        assert!(markup.contains(">14.3%</text>"));
    }

    #[test]
    fn single_slice_draws_full_disc() {
        let markup = svg_markup(&ChartData {
            labels: vec!["Correct Answers".to_string()],
            sizes: vec![5],
        });
        assert!(markup.contains("<circle "));
        assert!(!markup.contains("<path "));
        assert!(markup.contains(">100.0%</text>"));
    }

    #[test]
    fn labels_are_xml_escaped() {
        let markup = svg_markup(&ChartData {
            labels: vec!["rushed & <tired>".to_string()],
            sizes: vec![1],
        });
        assert!(markup.contains("rushed &amp; &lt;tired&gt;"));
    }

    #[test]
    fn renders_png_bytes() {
        let bytes = render_png(&sample()).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn empty_chart_data_is_rejected() {
        let empty = ChartData {
            labels: Vec::new(),
            sizes: Vec::new(),
        };
        assert!(render_png(&empty).is_err());
    }
}

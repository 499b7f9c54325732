use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui::Color32;
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::PlotError;
use crate::figure::{DisplayRange, Figure, LINE_WIDTH, RAW_MARKER_ALPHA, RAW_MARKER_SIZE};

/// Output resolution of raster exports.
pub const RASTER_DPI: f64 = 300.0;
/// Pixel density used to size vector exports.
pub const VECTOR_DPI: f64 = 100.0;
/// Plot-area size (without the legend column), in inches.
pub const FIGURE_SIZE_IN: (f64, f64) = (6.5, 3.25);

const TICK_FONT_PT: f64 = 8.0;
const AXIS_FONT_PT: f64 = 10.0;
const LEGEND_FONT_PT: f64 = 8.0;

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG at [`RASTER_DPI`].
    Png,
    /// SVG document.
    Svg,
}

impl ExportFormat {
    /// Pick the format from the file extension. A missing extension
    /// defaults to PNG and is appended to the returned path.
    pub fn from_path(path: &Path) -> Result<(Self, PathBuf), PlotError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            None => Ok((ExportFormat::Png, path.with_extension("png"))),
            Some("png") => Ok((ExportFormat::Png, path.to_path_buf())),
            Some("svg") => Ok((ExportFormat::Svg, path.to_path_buf())),
            Some(other) => Err(PlotError::ExportFailure(format!(
                "unsupported file extension .{other} (use .png or .svg)"
            ))),
        }
    }

    pub fn dpi(&self) -> f64 {
        match self {
            ExportFormat::Png => RASTER_DPI,
            ExportFormat::Svg => VECTOR_DPI,
        }
    }
}

// ---------------------------------------------------------------------------
// Canvas layout
// ---------------------------------------------------------------------------

/// Pixel layout of an exported figure: the chart on the left, the legend
/// in its own column to the right so it is never clipped by the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    pub dpi: f64,
    pub plot_width: u32,
    pub legend_width: u32,
    pub height: u32,
    pub legend_font_px: f64,
    pub legend_row_px: f64,
    pub legend_pad_px: f64,
}

impl CanvasLayout {
    pub fn for_figure(figure: &Figure, dpi: f64) -> Self {
        let px = |pt: f64| pt * dpi / 72.0;
        let legend_font_px = px(LEGEND_FONT_PT);
        let legend_row_px = legend_font_px * 1.5;
        let legend_pad_px = px(4.0);

        let plot_width = (FIGURE_SIZE_IN.0 * dpi).round() as u32;
        let plot_height = (FIGURE_SIZE_IN.1 * dpi).round() as u32;

        let legend_font = ("sans-serif", legend_font_px).into_font();
        let widest = figure
            .labels()
            .map(|label| label_width(&legend_font, label))
            .reduce(f64::max);
        let legend_width = match widest {
            None => 0,
            Some(text) => {
                let swatch = legend_font_px * 2.0;
                (legend_pad_px * 4.0 + swatch + text).ceil() as u32
            }
        };
        let legend_height =
            (legend_pad_px * 2.0 + legend_row_px * figure.traces.len() as f64).ceil() as u32;

        Self {
            dpi,
            plot_width,
            legend_width,
            height: plot_height.max(legend_height),
            legend_font_px,
            legend_row_px,
            legend_pad_px,
        }
    }

    pub fn width(&self) -> u32 {
        self.plot_width + self.legend_width
    }

    fn px(&self, pt: f64) -> f64 {
        pt * self.dpi / 72.0
    }

    /// Baseline of legend row `i`, relative to the legend column.
    pub fn legend_row_y(&self, i: usize) -> f64 {
        self.legend_pad_px + self.legend_row_px * (i as f64 + 0.5)
    }
}

/// Rendered width of `label` in pixels. Falls back to a wide per-glyph
/// estimate when the font cannot be resolved.
fn label_width(font: &FontDesc<'_>, label: &str) -> f64 {
    match font.box_size(label) {
        Ok((w, _)) => w as f64,
        Err(e) => {
            log::debug!("Could not measure legend label {label:?}: {e:?}");
            label.chars().count() as f64 * font.get_size()
        }
    }
}

// ---------------------------------------------------------------------------
// Export entry-point
// ---------------------------------------------------------------------------

/// Write `figure` to `path` as PNG or SVG (chosen by extension).
/// Returns the path actually written.
pub fn export_figure(figure: &Figure, path: &Path) -> Result<PathBuf, PlotError> {
    let (format, path) = ExportFormat::from_path(path)?;
    let layout = CanvasLayout::for_figure(figure, format.dpi());

    let written = match format {
        ExportFormat::Png => write_png(figure, &layout, &path),
        ExportFormat::Svg => write_svg(figure, &layout, &path),
    };
    written.map_err(|e| PlotError::ExportFailure(format!("{e:#}")))?;

    log::info!(
        "Exported {} traces to {} ({}x{} px, {:?})",
        figure.traces.len(),
        path.display(),
        layout.width(),
        layout.height,
        format
    );
    Ok(path)
}

fn write_png(figure: &Figure, layout: &CanvasLayout, path: &Path) -> Result<()> {
    let (w, h) = (layout.width(), layout.height);
    let mut buffer = vec![0u8; (w as usize) * (h as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
        draw_figure(&root, figure, layout).context("rendering figure")?;
        root.present().context("rendering figure")?;
    }
    let image = RgbImage::from_raw(w, h, buffer).context("failed to allocate image buffer")?;
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))
}

fn write_svg(figure: &Figure, layout: &CanvasLayout, path: &Path) -> Result<()> {
    let root = SVGBackend::new(path, (layout.width(), layout.height)).into_drawing_area();
    draw_figure(&root, figure, layout).context("rendering figure")?;
    root.present()
        .with_context(|| format!("writing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn rgb(c: Color32) -> RGBColor {
    RGBColor(c.r(), c.g(), c.b())
}

fn draw_figure<DB>(
    root: &DrawingArea<DB, Shift>,
    figure: &Figure,
    layout: &CanvasLayout,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let (plot_area, legend_area) = root.split_horizontally(layout.plot_width);

    let tick_font = ("sans-serif", layout.px(TICK_FONT_PT)).into_font();
    let axis_font = ("sans-serif", layout.px(AXIS_FONT_PT)).into_font();
    let line_px = layout.px(LINE_WIDTH as f64).round().max(1.0) as u32;
    let marker_radius = (layout.px(RAW_MARKER_SIZE as f64) / 2.0).round().max(1.0) as i32;

    let x = figure.x_range;
    let y = figure.y_range;
    // bounds in the order given; a reversed range draws an inverted axis
    let ((x0, x1), (y0, y1)) = (x.render_bounds(), y.render_bounds());
    let mut chart = ChartBuilder::on(&plot_area)
        .margin(layout.px(6.0) as u32)
        .x_label_area_size(layout.px(28.0) as u32)
        .y_label_area_size(layout.px(36.0) as u32)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(figure.x_label)
        .y_desc(figure.y_label)
        .label_style(tick_font)
        .axis_desc_style(axis_font)
        .axis_style(BLACK.stroke_width(line_px.div_ceil(2)))
        .draw()?;

    for trace in &figure.traces {
        let color = rgb(trace.color);

        if let Some(raw) = &trace.raw_points {
            let style = color.mix(RAW_MARKER_ALPHA as f64).filled();
            chart.draw_series(
                raw.iter()
                    .filter(|p| x.contains(p[0]) && y.contains(p[1]))
                    .map(|p| Circle::new((p[0], p[1]), marker_radius, style)),
            )?;
        }

        for segment in clip_polyline(&trace.line, x, y) {
            chart.draw_series(LineSeries::new(segment, color.stroke_width(line_px)))?;
        }
    }

    draw_legend(&legend_area, figure, layout)?;
    Ok(())
}

fn draw_legend<DB>(area: &DrawingArea<DB, Shift>, figure: &Figure, layout: &CanvasLayout) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let font = ("sans-serif", layout.legend_font_px)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    let swatch = (layout.legend_font_px * 2.0) as i32;
    let left = layout.legend_pad_px as i32;
    let line_px = layout.px(LINE_WIDTH as f64).round().max(1.0) as u32;

    for (i, trace) in figure.traces.iter().enumerate() {
        let row = layout.legend_row_y(i) as i32;
        area.draw(&PathElement::new(
            vec![(left, row), (left + swatch, row)],
            rgb(trace.color).stroke_width(line_px),
        ))?;
        area.draw(&Text::new(
            trace.label.clone(),
            (left + swatch + left, row),
            font.clone(),
        ))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Clipping
// ---------------------------------------------------------------------------

/// Cut a polyline to the display rectangle, returning the visible pieces.
/// Segments crossing the border are cut at the border.
pub fn clip_polyline(
    points: &[[f64; 2]],
    x: DisplayRange,
    y: DisplayRange,
) -> Vec<Vec<(f64, f64)>> {
    let (x0, x1) = x.ordered();
    let (y0, y1) = y.ordered();
    let mut pieces: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for pair in points.windows(2) {
        let (a, b) = ((pair[0][0], pair[0][1]), (pair[1][0], pair[1][1]));
        match clip_segment(a, b, (x0, x1), (y0, y1)) {
            Some((ca, cb)) => {
                if current.last() != Some(&ca) {
                    if !current.is_empty() {
                        pieces.push(std::mem::take(&mut current));
                    }
                    current.push(ca);
                }
                current.push(cb);
            }
            None => {
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    if points.len() == 1 {
        let (px, py) = (points[0][0], points[0][1]);
        if x.contains(px) && y.contains(py) {
            pieces.push(vec![(px, py)]);
        }
    }
    pieces
}

/// Liang-Barsky segment clipping.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    (x0, x1): (f64, f64),
    (y0, y1): (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
        (-dx, a.0 - x0),
        (dx, x1 - a.0),
        (-dy, a.1 - y0),
        (dy, y1 - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| {
        if t == 0.0 {
            a
        } else if t == 1.0 {
            b
        } else {
            (a.0 + t * dx, a.1 + t * dy)
        }
    };
    Some((at(t0), at(t1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::FigureTrace;

    fn figure(labels: &[&str]) -> Figure {
        Figure {
            traces: labels
                .iter()
                .map(|l| FigureTrace {
                    label: l.to_string(),
                    color: Color32::BLACK,
                    line: vec![[400.0, 1.0], [500.0, 2.0]],
                    raw_points: None,
                })
                .collect(),
            x_range: DisplayRange::new(400.0, 700.0),
            y_range: DisplayRange::new(0.0, 10.0),
            x_label: "x",
            y_label: "y",
        }
    }

    #[test]
    fn format_from_extension() {
        let (f, p) = ExportFormat::from_path(Path::new("out/plot.png")).unwrap();
        assert_eq!((f, p), (ExportFormat::Png, PathBuf::from("out/plot.png")));

        let (f, _) = ExportFormat::from_path(Path::new("plot.SVG")).unwrap();
        assert_eq!(f, ExportFormat::Svg);

        let (f, p) = ExportFormat::from_path(Path::new("plot")).unwrap();
        assert_eq!((f, p), (ExportFormat::Png, PathBuf::from("plot.png")));

        assert!(matches!(
            ExportFormat::from_path(Path::new("plot.pdf")),
            Err(PlotError::ExportFailure(_))
        ));
    }

    #[test]
    fn raster_canvas_is_300_dpi() {
        let layout = CanvasLayout::for_figure(&figure(&["1ps"]), RASTER_DPI);
        assert_eq!(layout.plot_width, 1950);
        assert_eq!(layout.height, 975);
        assert!(layout.legend_width > 0);
        assert_eq!(layout.width(), 1950 + layout.legend_width);
    }

    #[test]
    fn legend_fits_inside_canvas() {
        let short = CanvasLayout::for_figure(&figure(&["1ps"]), RASTER_DPI);
        let long = CanvasLayout::for_figure(&figure(&["1ps", "1000000 ps (pump off)"]), RASTER_DPI);
        assert!(long.legend_width > short.legend_width);

        let many: Vec<String> = (0..80).map(|i| format!("{i}ps")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let layout = CanvasLayout::for_figure(&figure(&refs), RASTER_DPI);
        let last_row = layout.legend_row_y(refs.len() - 1) + layout.legend_row_px / 2.0;
        assert!(last_row <= layout.height as f64);
        assert!(layout.height > 975);
    }

    #[test]
    fn empty_figure_has_no_legend_column() {
        let layout = CanvasLayout::for_figure(&figure(&[]), VECTOR_DPI);
        assert_eq!(layout.legend_width, 0);
        assert_eq!(layout.width(), 650);
    }

    #[test]
    fn clipping_keeps_inside_and_cuts_at_border() {
        let x = DisplayRange::new(0.0, 10.0);
        let y = DisplayRange::new(0.0, 10.0);

        let inside = clip_polyline(&[[1.0, 1.0], [2.0, 2.0], [3.0, 1.0]], x, y);
        assert_eq!(inside, vec![vec![(1.0, 1.0), (2.0, 2.0), (3.0, 1.0)]]);

        let crossing = clip_polyline(&[[5.0, 5.0], [15.0, 5.0]], x, y);
        assert_eq!(crossing, vec![vec![(5.0, 5.0), (10.0, 5.0)]]);

        // leaves through the top and comes back: two pieces
        let pieces = clip_polyline(&[[1.0, 5.0], [2.0, 20.0], [3.0, 5.0]], x, y);
        assert_eq!(pieces.len(), 2);
        assert!(pieces.iter().flatten().all(|p| p.1 <= 10.0));

        let outside = clip_polyline(&[[20.0, 20.0], [30.0, 30.0]], x, y);
        assert!(outside.is_empty());
    }

    #[test]
    fn clipping_handles_reversed_ranges() {
        let x = DisplayRange::new(10.0, 0.0);
        let y = DisplayRange::new(10.0, 0.0);
        let pieces = clip_polyline(&[[-5.0, 5.0], [5.0, 5.0]], x, y);
        assert_eq!(pieces, vec![vec![(0.0, 5.0), (5.0, 5.0)]]);
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ta_plotter_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn red_line(label: &str, y_range: DisplayRange) -> Figure {
        Figure {
            traces: vec![FigureTrace {
                label: label.to_string(),
                color: Color32::from_rgb(255, 0, 0),
                line: vec![[400.0, 1.0], [700.0, 9.0]],
                raw_points: None,
            }],
            x_range: DisplayRange::new(400.0, 700.0),
            y_range,
            x_label: "x",
            y_label: "y",
        }
    }

    fn is_red(p: &image::Rgb<u8>) -> bool {
        p[0] > 200 && p[1] < 80 && p[2] < 80
    }

    /// Mean row of the red pixels in plot-area columns `cols`.
    fn red_row(img: &RgbImage, cols: std::ops::Range<u32>) -> f64 {
        let rows: Vec<u32> = cols
            .flat_map(|x| (0..img.height()).map(move |y| (x, y)))
            .filter(|&(x, y)| is_red(img.get_pixel(x, y)))
            .map(|(_, y)| y)
            .collect();
        assert!(!rows.is_empty());
        rows.iter().map(|&y| y as f64).sum::<f64>() / rows.len() as f64
    }

    #[test]
    fn png_export_is_300_dpi_and_readable() {
        let dir = scratch_dir("png_export");
        let fig = figure(&["1ps", "5ps", "1ns"]);
        let written = export_figure(&fig, &dir.join("plot")).unwrap();
        assert_eq!(written, dir.join("plot.png"));

        let layout = CanvasLayout::for_figure(&fig, RASTER_DPI);
        let img = image::open(&written).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (layout.width(), 975));
        assert!(img.width() > 1950);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn svg_export_writes_a_document() {
        let dir = scratch_dir("svg_export");
        let fig = figure(&["1ps", "100ps"]);
        let written = export_figure(&fig, &dir.join("plot.svg")).unwrap();

        let text = std::fs::read_to_string(&written).unwrap();
        assert!(text.trim_start().starts_with("<svg"));
        assert!(text.trim_end().ends_with("</svg>"));
        assert!(text.contains("100ps"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn wide_legend_labels_are_not_clipped() {
        let dir = scratch_dir("wide_legend");
        for (i, label) in ["1ps", "WWWWWWWWWWWWWWWWWWWW", "MMMM (pump on, 1000 ps)"]
            .into_iter()
            .enumerate()
        {
            let path = export_figure(
                &red_line(label, DisplayRange::new(0.0, 10.0)),
                &dir.join(format!("legend_{i}.png")),
            )
            .unwrap();
            let img = image::open(&path).unwrap().to_rgb8();
            let edge = img.width() - 1;
            let inked = (0..img.height())
                .filter(|&y| img.get_pixel(edge, y).0 != [255, 255, 255])
                .count();
            assert_eq!(inked, 0, "label {label:?} reaches the right edge");
        }
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reversed_y_range_draws_an_inverted_axis() {
        let dir = scratch_dir("inverted_axis");
        let upright = export_figure(
            &red_line("a", DisplayRange::new(0.0, 10.0)),
            &dir.join("upright.png"),
        )
        .unwrap();
        let inverted = export_figure(
            &red_line("a", DisplayRange::new(10.0, 0.0)),
            &dir.join("inverted.png"),
        )
        .unwrap();

        let upright = image::open(upright).unwrap().to_rgb8();
        let inverted = image::open(inverted).unwrap().to_rgb8();

        // line rises from y=1 to y=9: upwards normally, downwards when inverted
        let (left, right) = (500..600, 1700..1800);
        assert!(red_row(&upright, left.clone()) > red_row(&upright, right.clone()));
        assert!(red_row(&inverted, left) < red_row(&inverted, right));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unwritable_path_is_export_failure() {
        let fig = figure(&["1ps", "2ps"]);
        for name in ["plot.png", "plot.svg"] {
            let path = Path::new("/nonexistent-dir/for/export").join(name);
            assert!(matches!(
                export_figure(&fig, &path),
                Err(PlotError::ExportFailure(_))
            ));
        }
    }
}

use eframe::egui::Color32;

use crate::color;
use crate::data::filter::SavitzkyGolay;
use crate::data::model::{Dataset, extract_traces};
use crate::error::PlotError;

pub const X_LABEL: &str = "Wavelength (nm)";
pub const Y_LABEL: &str = "ΔA (mOD)";

/// Line width of every trace, in points.
pub const LINE_WIDTH: f32 = 1.5;
/// Diameter of the raw-data markers, in points.
pub const RAW_MARKER_SIZE: f32 = 2.0;
/// Opacity of the raw-data markers.
pub const RAW_MARKER_ALPHA: f32 = 0.5;

// ---------------------------------------------------------------------------
// Form inputs (as typed by the user)
// ---------------------------------------------------------------------------

/// The plot controls, exactly as entered. Nothing here is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotInputs {
    pub use_filter: bool,
    pub show_raw: bool,
    pub window_length: String,
    pub polyorder: String,
    pub x_min: String,
    pub x_max: String,
    pub y_min: String,
    pub y_max: String,
}

impl Default for PlotInputs {
    fn default() -> Self {
        Self {
            use_filter: false,
            show_raw: false,
            window_length: "51".into(),
            polyorder: "3".into(),
            x_min: "400".into(),
            x_max: "700".into(),
            y_min: "0".into(),
            y_max: "10".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validated parameters
// ---------------------------------------------------------------------------

/// Visible bounds of one axis. `min < max` is not required.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRange {
    pub min: f64,
    pub max: f64,
}

impl DisplayRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Bounds in ascending order.
    pub fn ordered(&self) -> (f64, f64) {
        (self.min.min(self.max), self.min.max(self.max))
    }

    /// Axis bounds in the order given, widened when the span is empty.
    /// `min > max` yields an inverted axis.
    pub fn render_bounds(&self) -> (f64, f64) {
        if self.min == self.max {
            (self.min - 0.5, self.max + 0.5)
        } else {
            (self.min, self.max)
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.min > self.max
    }

    /// `-1.0` for an inverted axis, `1.0` otherwise. Multiplying data
    /// coordinates by this maps an inverted axis onto an ascending one.
    pub fn direction(&self) -> f64 {
        if self.is_inverted() {
            -1.0
        } else {
            1.0
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        let (lo, hi) = self.ordered();
        (lo..=hi).contains(&v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParameters {
    pub window_length: usize,
    pub polyorder: usize,
}

/// Everything a plot needs, parsed and checked.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    /// `Some` when smoothing is enabled.
    pub smoothing: Option<FilterParameters>,
    pub show_raw: bool,
    pub x_range: DisplayRange,
    pub y_range: DisplayRange,
}

impl PlotRequest {
    /// Parse and check the form fields. Has no side effects.
    ///
    /// The window length must be odd even when smoothing is off; the
    /// remaining filter constraints only apply when it is on.
    pub fn parse(inputs: &PlotInputs) -> Result<Self, PlotError> {
        let window_length = parse_int(&inputs.window_length, "Window length")?;
        let polyorder = parse_int(&inputs.polyorder, "Polynomial order")?;
        let x_range = DisplayRange::new(
            parse_float(&inputs.x_min, "Wavelength minimum")?,
            parse_float(&inputs.x_max, "Wavelength maximum")?,
        );
        let y_range = DisplayRange::new(
            parse_float(&inputs.y_min, "ΔA minimum")?,
            parse_float(&inputs.y_max, "ΔA maximum")?,
        );

        if window_length % 2 == 0 {
            return Err(PlotError::InvalidParameter(
                "Window length must be an odd number.".into(),
            ));
        }

        let smoothing = if inputs.use_filter {
            if window_length < 1 {
                return Err(PlotError::InvalidParameter(
                    "Window length must be a positive odd number.".into(),
                ));
            }
            if polyorder < 0 {
                return Err(PlotError::InvalidParameter(
                    "Polynomial order must not be negative.".into(),
                ));
            }
            if polyorder >= window_length {
                return Err(PlotError::InvalidParameter(format!(
                    "Polynomial order ({polyorder}) must be less than window length ({window_length})."
                )));
            }
            Some(FilterParameters {
                window_length: window_length as usize,
                polyorder: polyorder as usize,
            })
        } else {
            None
        };

        Ok(Self {
            smoothing,
            show_raw: inputs.show_raw,
            x_range,
            y_range,
        })
    }
}

fn parse_int(text: &str, field: &str) -> Result<i64, PlotError> {
    text.trim().parse::<i64>().map_err(|_| {
        PlotError::InvalidParameter(format!("{field} must be an integer, got {text:?}."))
    })
}

fn parse_float(text: &str, field: &str) -> Result<f64, PlotError> {
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(PlotError::InvalidParameter(format!(
            "{field} must be a number, got {text:?}."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Figure – backend-independent description of a rendered chart
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FigureTrace {
    /// Legend entry (delay time).
    pub label: String,
    pub color: Color32,
    /// Smoothed curve when filtering, otherwise the raw data.
    pub line: Vec<[f64; 2]>,
    /// Unlabelled raw markers drawn under a smoothed line.
    pub raw_points: Option<Vec<[f64; 2]>>,
}

/// The chart shown in the central panel and written by the exporter.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub traces: Vec<FigureTrace>,
    pub x_range: DisplayRange,
    pub y_range: DisplayRange,
    pub x_label: &'static str,
    pub y_label: &'static str,
}

impl Figure {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.traces.iter().map(|t| t.label.as_str())
    }
}

/// Validate the inputs against the dataset and build the figure.
///
/// Pure: the caller swaps the result in only on success, so a rejected
/// request never disturbs the chart currently on screen.
pub fn build_figure(dataset: Option<&Dataset>, inputs: &PlotInputs) -> Result<Figure, PlotError> {
    let dataset = dataset.ok_or(PlotError::NoDataLoaded)?;
    let request = PlotRequest::parse(inputs)?;
    let traces = extract_traces(dataset)?;

    let smoother = match request.smoothing {
        Some(params) => {
            if let Some(short) = traces.iter().find(|t| t.len() < params.window_length) {
                return Err(PlotError::InvalidParameter(format!(
                    "Window length ({}) must not exceed the number of points in trace {:?} ({}).",
                    params.window_length,
                    short.label,
                    short.len()
                )));
            }
            Some(SavitzkyGolay::new(params.window_length, params.polyorder)?)
        }
        None => None,
    };

    let colors = color::gradient(traces.len());

    let traces = traces
        .iter()
        .zip(colors)
        .map(|(trace, color)| {
            let (x, y) = trace.samples();
            let zip = |ys: &[f64]| -> Vec<[f64; 2]> {
                x.iter().zip(ys).map(|(&xi, &yi)| [xi, yi]).collect()
            };
            match &smoother {
                Some(sg) => FigureTrace {
                    label: trace.label.to_string(),
                    color,
                    line: zip(&sg.apply(&y)),
                    raw_points: request.show_raw.then(|| zip(&y)),
                },
                None => FigureTrace {
                    label: trace.label.to_string(),
                    color,
                    line: zip(&y),
                    raw_points: None,
                },
            }
        })
        .collect();

    Ok(Figure {
        traces,
        x_range: request.x_range,
        y_range: request.y_range,
        x_label: X_LABEL,
        y_label: Y_LABEL,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn two_trace_dataset(points: usize) -> Dataset {
        let wl: Vec<f64> = (0..points).map(|i| 400.0 + i as f64).collect();
        let sig = |scale: f64| -> Vec<f64> {
            (0..points).map(|i| scale * (i as f64 * 0.05).sin().abs()).collect()
        };
        Dataset::new(vec![
            Column::new("WL1", wl.clone()),
            Column::new("Sig, 1ps", sig(5.0)),
            Column::new("WL2", wl),
            Column::new("Sig, 2ps", sig(8.0)),
        ])
    }

    fn inputs() -> PlotInputs {
        PlotInputs::default()
    }

    #[test]
    fn defaults_match_the_form() {
        let i = PlotInputs::default();
        assert_eq!(i.window_length, "51");
        assert_eq!(i.polyorder, "3");
        assert!(!i.use_filter && !i.show_raw);
        let req = PlotRequest::parse(&i).unwrap();
        assert_eq!(req.x_range, DisplayRange::new(400.0, 700.0));
        assert_eq!(req.y_range, DisplayRange::new(0.0, 10.0));
        assert_eq!(req.smoothing, None);
    }

    #[test]
    fn two_unfiltered_traces_with_ranges() {
        let ds = two_trace_dataset(100);
        let fig = build_figure(Some(&ds), &inputs()).unwrap();
        assert_eq!(fig.labels().collect::<Vec<_>>(), vec!["1ps", "2ps"]);
        assert_eq!(fig.x_range, DisplayRange::new(400.0, 700.0));
        assert_eq!(fig.y_range, DisplayRange::new(0.0, 10.0));
        assert_eq!(fig.x_label, "Wavelength (nm)");
        assert_eq!(fig.y_label, "ΔA (mOD)");
        assert!(fig.traces.iter().all(|t| t.raw_points.is_none()));
        assert_eq!(fig.traces[1].line[3], [403.0, ds.columns[3].values[3]]);
        assert_eq!(fig.traces[0].color, color::magma(0.0));
        assert_eq!(fig.traces[1].color, color::magma(1.0));
    }

    #[test]
    fn even_window_is_rejected_with_or_without_filter() {
        let ds = two_trace_dataset(100);
        for use_filter in [false, true] {
            for w in ["50", "2", "0", "-4"] {
                let mut i = inputs();
                i.use_filter = use_filter;
                i.window_length = w.into();
                assert_eq!(
                    build_figure(Some(&ds), &i),
                    Err(PlotError::InvalidParameter(
                        "Window length must be an odd number.".into()
                    ))
                );
            }
        }
    }

    #[test]
    fn non_numeric_fields_are_rejected() {
        let ds = two_trace_dataset(100);
        let cases: [fn(&mut PlotInputs); 6] = [
            |i| i.window_length = "abc".into(),
            |i| i.polyorder = "3.5".into(),
            |i| i.x_min = "".into(),
            |i| i.x_max = "seven".into(),
            |i| i.y_min = "nan".into(),
            |i| i.y_max = "1e".into(),
        ];
        for edit in cases {
            let mut i = inputs();
            edit(&mut i);
            assert!(matches!(
                build_figure(Some(&ds), &i),
                Err(PlotError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn filter_constraints() {
        let ds = two_trace_dataset(40);
        let mut i = inputs();
        i.use_filter = true;

        i.window_length = "5".into();
        i.polyorder = "5".into();
        assert!(matches!(build_figure(Some(&ds), &i), Err(PlotError::InvalidParameter(_))));

        i.polyorder = "-1".into();
        assert!(matches!(build_figure(Some(&ds), &i), Err(PlotError::InvalidParameter(_))));

        i.window_length = "41".into();
        i.polyorder = "3".into();
        let err = build_figure(Some(&ds), &i).unwrap_err();
        assert!(err.to_string().contains("must not exceed"), "{err}");

        i.window_length = "39".into();
        assert!(build_figure(Some(&ds), &i).is_ok());
    }

    #[test]
    fn filter_constraints_ignored_when_filter_off() {
        let ds = two_trace_dataset(10);
        let mut i = inputs();
        i.window_length = "51".into();
        i.polyorder = "99".into();
        assert!(build_figure(Some(&ds), &i).is_ok());
    }

    #[test]
    fn smoothing_with_raw_overlay() {
        let ds = two_trace_dataset(120);
        let mut i = inputs();
        i.use_filter = true;
        i.window_length = "11".into();
        i.polyorder = "2".into();

        let fig = build_figure(Some(&ds), &i).unwrap();
        assert!(fig.traces.iter().all(|t| t.raw_points.is_none()));
        assert_ne!(fig.traces[0].line[10][1], ds.columns[1].values[10]);
        assert_eq!(fig.traces[0].line.len(), 120);

        i.show_raw = true;
        let fig = build_figure(Some(&ds), &i).unwrap();
        let raw = fig.traces[0].raw_points.as_ref().unwrap();
        assert_eq!(raw.len(), 120);
        assert_eq!(raw[10], [410.0, ds.columns[1].values[10]]);
    }

    #[test]
    fn raw_overlay_needs_filter() {
        let ds = two_trace_dataset(50);
        let mut i = inputs();
        i.show_raw = true;
        let fig = build_figure(Some(&ds), &i).unwrap();
        assert!(fig.traces.iter().all(|t| t.raw_points.is_none()));
    }

    #[test]
    fn no_dataset_is_no_data_loaded() {
        let mut i = inputs();
        i.window_length = "50".into();
        assert_eq!(build_figure(None, &i), Err(PlotError::NoDataLoaded));
    }

    #[test]
    fn plotting_is_deterministic() {
        let ds = two_trace_dataset(80);
        let mut i = inputs();
        i.use_filter = true;
        i.show_raw = true;
        i.window_length = "21".into();
        assert_eq!(build_figure(Some(&ds), &i), build_figure(Some(&ds), &i));
    }

    #[test]
    fn odd_columns_and_missing_labels() {
        let mut ds = two_trace_dataset(20);
        ds.columns.push(Column::new("WL3", vec![1.0; 20]));
        assert_eq!(build_figure(Some(&ds), &inputs()).unwrap().traces.len(), 2);

        ds.columns.push(Column::new("no label", vec![1.0; 20]));
        assert!(matches!(
            build_figure(Some(&ds), &inputs()),
            Err(PlotError::MalformedInput(_))
        ));
    }

    #[test]
    fn reversed_range_is_passed_through() {
        let ds = two_trace_dataset(20);
        let mut i = inputs();
        i.y_min = "10".into();
        i.y_max = "0".into();
        let fig = build_figure(Some(&ds), &i).unwrap();
        assert_eq!(fig.y_range, DisplayRange::new(10.0, 0.0));
        assert_eq!(fig.y_range.ordered(), (0.0, 10.0));
        assert!(fig.y_range.contains(5.0));
        assert_eq!(DisplayRange::new(3.0, 3.0).render_bounds(), (2.5, 3.5));
    }

    #[test]
    fn reversed_range_keeps_its_orientation() {
        let inverted = DisplayRange::new(10.0, 0.0);
        assert!(inverted.is_inverted());
        assert_eq!(inverted.render_bounds(), (10.0, 0.0));
        assert_eq!(inverted.direction(), -1.0);

        // mirrored bounds ascend, so an ascending view shows the axis flipped
        let (lo, hi) = inverted.render_bounds();
        assert!(lo * inverted.direction() < hi * inverted.direction());

        let upright = DisplayRange::new(0.0, 10.0);
        assert!(!upright.is_inverted());
        assert_eq!(upright.render_bounds(), (0.0, 10.0));
        assert_eq!(upright.direction(), 1.0);
    }
}

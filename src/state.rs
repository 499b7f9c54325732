use std::path::{Path, PathBuf};

use crate::data::loader::load_csv;
use crate::data::model::Dataset;
use crate::error::PlotError;
use crate::export::export_figure;
use crate::figure::{Figure, PlotInputs, build_figure};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One row of the loaded-traces table.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSummary {
    /// Delay-time label, or `None` when the header has no comma.
    pub label: Option<String>,
    pub points: usize,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// File the dataset came from.
    pub source: Option<PathBuf>,

    /// Per-trace summary of the loaded dataset (cached).
    pub trace_summary: Vec<TraceSummary>,

    /// Plot controls as typed by the user.
    pub inputs: PlotInputs,

    /// The figure currently shown (None until the first successful plot).
    pub figure: Option<Figure>,

    /// Bumped every time a new figure replaces the old one.
    pub figure_generation: u64,

    /// Set when a new figure still needs its display ranges applied.
    pub bounds_pending: bool,

    /// Blocking notice waiting to be acknowledged.
    pub notice: Option<PlotError>,

    /// Status line message.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            source: None,
            trace_summary: Vec::new(),
            inputs: PlotInputs::default(),
            figure: None,
            figure_generation: 0,
            bounds_pending: false,
            notice: None,
            status_message: None,
        }
    }
}

impl AppState {
    /// Load a CSV, replacing any previous dataset. The current figure stays
    /// on screen until the next plot.
    pub fn load_dataset(&mut self, path: &Path) -> Result<(), PlotError> {
        match load_csv(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded data from {} ({} columns, {} rows, {} traces)",
                    path.display(),
                    dataset.width(),
                    dataset.height(),
                    dataset.trace_count()
                );
                self.set_dataset(dataset, Some(path.to_path_buf()));
                Ok(())
            }
            Err(e) => {
                let err = PlotError::MalformedInput(format!("{e:#}"));
                Err(self.fail(err))
            }
        }
    }

    /// Ingest a newly loaded dataset and rebuild the trace summary.
    pub fn set_dataset(&mut self, dataset: Dataset, source: Option<PathBuf>) {
        if dataset.has_unpaired_column() {
            log::warn!(
                "Odd number of columns ({}); ignoring trailing column {:?}",
                dataset.width(),
                dataset.columns.last().map(|c| c.name.as_str()).unwrap_or_default()
            );
        }

        self.trace_summary = dataset
            .traces()
            .enumerate()
            .map(|(i, trace)| match trace {
                Ok(t) => TraceSummary {
                    label: Some(t.label.to_string()),
                    points: t.len(),
                },
                Err(e) => {
                    log::warn!("{e}");
                    TraceSummary {
                        label: None,
                        points: dataset.columns[2 * i + 1].values.len(),
                    }
                }
            })
            .collect();

        self.status_message = Some(format!(
            "{} traces loaded from {}",
            self.trace_summary.len(),
            source
                .as_deref()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "memory".into())
        ));
        self.dataset = Some(dataset);
        self.source = source;
    }

    /// Validate the inputs and, only on success, replace the current figure.
    pub fn plot(&mut self) -> Result<(), PlotError> {
        let figure = match build_figure(self.dataset.as_ref(), &self.inputs) {
            Ok(figure) => figure,
            Err(e) => return Err(self.fail(e)),
        };

        if self.figure.is_some() {
            log::debug!("Disposing figure #{}", self.figure_generation);
        }
        log::info!(
            "Plotted {} traces (filter: {})",
            figure.traces.len(),
            if self.inputs.use_filter { "on" } else { "off" }
        );
        self.figure = Some(figure);
        self.figure_generation += 1;
        self.bounds_pending = true;
        Ok(())
    }

    /// Whether there is a figure to export.
    pub fn can_export(&self) -> bool {
        self.figure.is_some()
    }

    /// Write the current figure to `path`. Returns `Ok(false)` without
    /// touching the filesystem when nothing has been plotted yet.
    pub fn export(&mut self, path: &Path) -> Result<bool, PlotError> {
        let Some(figure) = &self.figure else {
            log::debug!("Export requested with no figure; ignoring");
            return Ok(false);
        };
        match export_figure(figure, path) {
            Ok(written) => {
                self.status_message = Some(format!("Saved {}", written.display()));
                Ok(true)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Acknowledge the pending notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn fail(&mut self, err: PlotError) -> PlotError {
        if err.is_warning() {
            log::warn!("{err}");
        } else {
            log::error!("{err}");
        }
        self.notice = Some(err.clone());
        err
    }
}

use eframe::egui::{self, Align, Layout, Sense, Stroke, Ui, Vec2b};
use egui_plot::{GridMark, Line, Plot, PlotBounds, PlotPoints, Points};

use crate::figure::{Figure, LINE_WIDTH, RAW_MARKER_ALPHA, RAW_MARKER_SIZE};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Figure view (central panel)
// ---------------------------------------------------------------------------

/// Render the current figure in the central panel, with its legend in a
/// strip to the right of the plot area.
///
/// The display ranges are applied once per new figure; the user may pan and
/// zoom freely afterwards until the next plot. egui_plot axes always
/// ascend, so an inverted range is drawn by negating that coordinate and
/// un-negating it again in the tick and hover labels.
pub fn figure_plot(ui: &mut Ui, state: &mut AppState) {
    let apply_bounds = std::mem::take(&mut state.bounds_pending);

    let figure = match &state.figure {
        Some(fig) => fig,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                let hint = if state.dataset.is_some() {
                    "Press \"Plot Data\" to draw the traces"
                } else {
                    "Load a CSV to begin  (File → Load CSV…)"
                };
                ui.heading(hint);
            });
            return;
        }
    };

    let (sx, sy) = (figure.x_range.direction(), figure.y_range.direction());
    let mirror = |p: &[f64; 2]| [p[0] * sx, p[1] * sy];
    let ((x0, x1), (y0, y1)) = (figure.x_range.render_bounds(), figure.y_range.render_bounds());

    ui.with_layout(Layout::right_to_left(Align::Min), |ui: &mut Ui| {
        legend_strip(ui, figure);
        ui.separator();

        Plot::new(("ta_plot", state.figure_generation))
            .x_axis_label(figure.x_label)
            .y_axis_label(figure.y_label)
            .x_axis_formatter(move |mark: GridMark, _| tick_label(mark, sx))
            .y_axis_formatter(move |mark: GridMark, _| tick_label(mark, sy))
            .label_formatter(move |name, p| {
                let (x, y) = (p.x * sx, p.y * sy);
                if name.is_empty() {
                    format!("x = {x:.1}\ny = {y:.3}")
                } else {
                    format!("{name}\nx = {x:.1}\ny = {y:.3}")
                }
            })
            .auto_bounds(Vec2b::FALSE)
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true)
            .show(ui, |plot_ui| {
                if apply_bounds {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                        [(x0 * sx).min(x1 * sx), (y0 * sy).min(y1 * sy)],
                        [(x0 * sx).max(x1 * sx), (y0 * sy).max(y1 * sy)],
                    ));
                }

                for trace in &figure.traces {
                    if let Some(raw) = &trace.raw_points {
                        let points: PlotPoints = raw.iter().map(mirror).collect();
                        plot_ui.points(
                            Points::new(points)
                                .radius(RAW_MARKER_SIZE / 2.0)
                                .color(trace.color.gamma_multiply(RAW_MARKER_ALPHA)),
                        );
                    }

                    let points: PlotPoints = trace.line.iter().map(mirror).collect();
                    plot_ui.line(
                        Line::new(points)
                            .name(&trace.label)
                            .color(trace.color)
                            .width(LINE_WIDTH),
                    );
                }
            });
    });
}

fn tick_label(mark: GridMark, direction: f64) -> String {
    let decimals = (-mark.step_size.log10()).ceil().max(0.0) as usize;
    format!("{:.*}", decimals, mark.value * direction)
}

/// Fixed legend outside the plot area: one colour swatch and label per
/// trace, in column order.
fn legend_strip(ui: &mut Ui, figure: &Figure) {
    ui.vertical(|ui: &mut Ui| {
        egui::ScrollArea::vertical()
            .id_salt("legend_strip")
            .show(ui, |ui: &mut Ui| {
                for trace in &figure.traces {
                    ui.horizontal(|ui: &mut Ui| {
                        let (rect, _) = ui.allocate_exact_size(egui::vec2(24.0, 12.0), Sense::hover());
                        ui.painter().line_segment(
                            [rect.left_center(), rect.right_center()],
                            Stroke::new(LINE_WIDTH, trace.color),
                        );
                        ui.label(&trace.label);
                    });
                }
            });
    });
}

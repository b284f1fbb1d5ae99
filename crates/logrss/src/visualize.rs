use std::path::Path;

use logrss_core::{AnalysisReport, CaseReport};
use plotters::{coord::Shift, coord::types::RangedCoordf64, prelude::*};

// One color per held quantile.
const SERIES_COLORS: [RGBColor; 4] = [
    RGBColor(0x58, 0x50, 0x8d),
    RGBColor(0xbc, 0x50, 0x90),
    RGBColor(0xff, 0x63, 0x61),
    RGBColor(0xff, 0xa6, 0x00),
];

const LABEL_STYLE: (&str, i32) = ("sans-serif", 18);
const PANEL_SIZE: u32 = 600;
const PANEL_COLUMNS: usize = 3;

/// Markers for the linear-predictor values on each curve.
const MARKERS_PER_SERIES: usize = 20;

/// One panel per case: closed-form log-RSS as lines, linear-predictor log-RSS
/// as markers on top. Failed cases leave their panel blank.
pub fn save_png(report: &AnalysisReport, output_path: &Path) -> anyhow::Result<()> {
    let n = report.outcomes.len().max(1);
    let rows = n.div_ceil(PANEL_COLUMNS);
    let cols = n.min(PANEL_COLUMNS);

    let root = BitMapBackend::new(
        output_path,
        (PANEL_SIZE * cols as u32, PANEL_SIZE * rows as u32),
    )
    .into_drawing_area();
    root.fill(&WHITE)?;

    let panels = root.split_evenly((rows, cols));
    for (panel, outcome) in panels.iter().zip(report.outcomes.iter()) {
        if let Ok(case) = &outcome.result {
            draw_case(panel, case)?;
        }
    }

    // Finished.
    root.present()?;
    println!("Plot saved to {}", output_path.display());
    Ok(())
}

/// Span of one panel
struct Bounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Bounds {
    fn new(case: &CaseReport) -> Self {
        let xs = case.grid.vary_values.iter().copied();
        let ys = case
            .closed_form
            .iter()
            .chain(case.linear_predictor.values.iter())
            .copied()
            .filter(|y| y.is_finite());

        let (min_x, max_x) = padded(xs);
        let (min_y, max_y) = padded(ys);
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

/// Range of `values` with 5% padding, never empty.
fn padded(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = if hi - lo > f64::EPSILON {
        0.05 * (hi - lo)
    } else {
        1.0
    };
    (lo - pad, hi + pad)
}

fn draw_case<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    case: &CaseReport,
) -> anyhow::Result<()>
where
    <DB as plotters::prelude::DrawingBackend>::ErrorType: 'static,
{
    let bounds = Bounds::new(case);
    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .caption(case.case.to_string(), ("sans-serif", 20))
        .build_cartesian_2d(bounds.min_x..bounds.max_x, bounds.min_y..bounds.max_y)?;

    chart
        .configure_mesh()
        .x_desc(case.grid.vary.as_str())
        .y_desc("log-RSS")
        .label_style(LABEL_STYLE)
        .axis_desc_style(LABEL_STYLE)
        .draw()?;
    draw_zero_line(&mut chart, &bounds)?;

    let xs = &case.grid.vary_values;
    let every = (xs.len() / MARKERS_PER_SERIES).max(1);

    for (k, (quantile, range)) in case.grid.series().into_iter().enumerate() {
        let color = SERIES_COLORS[k % SERIES_COLORS.len()];
        let label = match (&case.grid.hold, quantile) {
            (Some(hold), Some(q)) => format!("{} at q{:.0}", hold.name, q * 100.0),
            _ => "log-RSS".to_string(),
        };

        let closed = xs
            .iter()
            .copied()
            .zip(case.closed_form.iter().skip(range.start).take(range.len()).copied());
        chart
            .draw_series(LineSeries::new(closed, color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

        let generic = xs
            .iter()
            .copied()
            .zip(
                case.linear_predictor
                    .values
                    .iter()
                    .skip(range.start)
                    .take(range.len())
                    .copied(),
            )
            .step_by(every);
        chart.draw_series(generic.map(|p| Circle::new(p, 4, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .label_font(LABEL_STYLE)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_zero_line<DB: DrawingBackend>(
    chart: &mut ChartContext<DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    bounds: &Bounds,
) -> anyhow::Result<()>
where
    <DB as plotters::prelude::DrawingBackend>::ErrorType: 'static,
{
    if bounds.min_y < 0.0 && bounds.max_y > 0.0 {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(bounds.min_x, 0.0), (bounds.max_x, 0.0)],
            BLACK.mix(0.5).stroke_width(1),
        )))?;
    }
    Ok(())
}

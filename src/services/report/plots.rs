//! SVG charts for the report bundle, drawn with plotters.

use crate::error::AppError;
use crate::models::{CategoryTable, CorrelationMatrix};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub const HISTOGRAM_BINS: usize = 20;
const MAX_MATRIX_ROWS: usize = 200;
const FONT: &str = "sans-serif";

const BAR_FILL: RGBColor = RGBColor(76, 114, 176);
const MISSING_FILL: RGBColor = RGBColor(34, 34, 34);
const PRESENT_FILL: RGBColor = RGBColor(232, 232, 232);
const UNDEFINED_FILL: RGBColor = RGBColor(204, 204, 204);
const NEGATIVE: RGBColor = RGBColor(59, 76, 192);
const POSITIVE: RGBColor = RGBColor(180, 4, 38);

/// Equal-width histogram of the non-null values of one column.
pub fn histogram(column: &str, values: &[f64], bins: usize) -> Result<String, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (640, 400)).into_drawing_area();
        root.fill(&WHITE)?;
        let caption = format!("Histogram: {}", truncate_label(column));

        if values.is_empty() {
            let area = root.titled(&caption, (FONT, 20))?;
            area.draw(&Text::new("no data", (290, 160), (FONT, 16).into_font()))?;
        } else {
            let binned = Bins::of(values, bins);
            let peak = binned.counts.iter().copied().max().unwrap_or(0);

            let mut chart = ChartBuilder::on(&root)
                .caption(&caption, (FONT, 20))
                .margin(10)
                .x_label_area_size(35)
                .y_label_area_size(45)
                .build_cartesian_2d(binned.start..binned.end(), 0u32..peak + 1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc(truncate_label(column))
                .y_desc("count")
                .draw()?;

            chart.draw_series(binned.counts.iter().enumerate().filter(|(_, c)| **c > 0).map(|(i, c)| {
                let x0 = binned.start + binned.width * i as f64;
                Rectangle::new([(x0, 0), (x0 + binned.width, *c)], BAR_FILL.filled())
            }))?;
        }
        root.present()?;
    }
    Ok(svg)
}

struct Bins {
    start: f64,
    width: f64,
    counts: Vec<u32>,
}

impl Bins {
    fn of(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = if max > min { max - min } else { 1.0 };
        let width = span / bins as f64;

        let mut counts = vec![0u32; bins];
        for v in values {
            let idx = ((v - min) / width) as usize;
            counts[idx.min(bins - 1)] += 1;
        }
        Self { start: min, width, counts }
    }

    fn end(&self) -> f64 {
        self.start + self.width * self.counts.len() as f64
    }
}

/// Horizontal bars for the most frequent values of a categorical column,
/// most frequent on top.
pub fn category_bars(table: &CategoryTable) -> Result<String, AppError> {
    let n = table.entries.len();
    let height = 80 + 32 * n.max(1) as u32;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (640, height)).into_drawing_area();
        root.fill(&WHITE)?;
        let caption = format!("Top values: {}", truncate_label(&table.column));

        if n == 0 {
            let area = root.titled(&caption, (FONT, 20))?;
            area.draw(&Text::new("no data", (290, 20), (FONT, 16).into_font()))?;
        } else {
            let labels: Vec<String> = table.entries.iter().map(|e| truncate_label(&e.value)).collect();
            let peak = table.entries.iter().map(|e| e.count as u32).max().unwrap_or(0);

            let mut chart = ChartBuilder::on(&root)
                .caption(&caption, (FONT, 20))
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(180)
                .build_cartesian_2d(0u32..peak + 1, (0..n as i32).into_segmented())?;

            let row_label = |v: &SegmentValue<i32>| match v {
                SegmentValue::CenterOf(row) => usize::try_from(*row)
                    .ok()
                    .and_then(|row| n.checked_sub(row + 1))
                    .and_then(|idx| labels.get(idx))
                    .cloned()
                    .unwrap_or_default(),
                _ => String::new(),
            };
            chart
                .configure_mesh()
                .disable_y_mesh()
                .y_labels(n)
                .y_label_formatter(&row_label)
                .x_desc("count")
                .draw()?;

            chart.draw_series(
                Histogram::horizontal(&chart)
                    .style(BAR_FILL.filled())
                    .margin(6)
                    .data(
                        table
                            .entries
                            .iter()
                            .enumerate()
                            .map(|(i, e)| ((n - 1 - i) as i32, e.count as u32)),
                    ),
            )?;
        }
        root.present()?;
    }
    Ok(svg)
}

/// Grid of cells, dark where a value is missing. Large frames are sampled
/// down to a fixed number of evenly spaced rows.
pub fn missing_matrix(columns: &[String], masks: &[Vec<bool>], n_rows: usize) -> Result<String, AppError> {
    let n_cols = columns.len().max(1);
    let shown_rows = n_rows.min(MAX_MATRIX_ROWS).max(1);
    let width = (80 + 48 * n_cols as u32).max(320);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, 480)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Missing values", (FONT, 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d((0..n_cols as i32).into_segmented(), 0..shown_rows as i32)?;

        let column_label = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(c) => usize::try_from(*c)
                .ok()
                .and_then(|c| columns.get(c))
                .map(|name| truncate_label(name))
                .unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n_cols)
            .x_label_formatter(&column_label)
            .y_labels(0)
            .y_desc(if n_rows > MAX_MATRIX_ROWS { "rows (sampled)" } else { "rows" })
            .draw()?;
        chart.plotting_area().fill(&PRESENT_FILL)?;

        let mut cells = Vec::new();
        for (c, mask) in masks.iter().enumerate() {
            for r in 0..n_rows.min(MAX_MATRIX_ROWS) {
                let source_row = if n_rows > MAX_MATRIX_ROWS { r * n_rows / MAX_MATRIX_ROWS } else { r };
                if mask.get(source_row).copied().unwrap_or(false) {
                    // first row at the top
                    let y = (shown_rows - 1 - r) as i32;
                    cells.push(Rectangle::new(
                        [
                            (SegmentValue::Exact(c as i32), y),
                            (SegmentValue::Exact(c as i32 + 1), y + 1),
                        ],
                        MISSING_FILL.filled(),
                    ));
                }
            }
        }
        chart.draw_series(cells)?;
        root.present()?;
    }
    Ok(svg)
}

pub fn correlation_heatmap(matrix: &CorrelationMatrix) -> Result<String, AppError> {
    let n = matrix.columns.len().max(1);
    let size = 200 + 60 * n as u32;
    let colormap = DerivedColorMap::new(&[NEGATIVE, WHITE, POSITIVE]);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (size, size)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Correlation (Pearson)", (FONT, 20))
            .margin(10)
            .x_label_area_size(120)
            .y_label_area_size(120)
            .build_cartesian_2d((0..n as i32).into_segmented(), (0..n as i32).into_segmented())?;

        // Row i is drawn at height n - 1 - i so the first column sits on top
        let x_label = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(j) => usize::try_from(*j)
                .ok()
                .and_then(|j| matrix.columns.get(j))
                .map(|name| truncate_label(name))
                .unwrap_or_default(),
            _ => String::new(),
        };
        let y_label = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(row) => usize::try_from(*row)
                .ok()
                .and_then(|row| n.checked_sub(row + 1))
                .and_then(|i| matrix.columns.get(i))
                .map(|name| truncate_label(name))
                .unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&x_label)
            .y_label_formatter(&y_label)
            .draw()?;

        let cells: Vec<(i32, i32, Option<f64>)> = matrix
            .values
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(j, value)| (j as i32, (n - 1 - i) as i32, *value))
            })
            .collect();

        chart.draw_series(cells.iter().map(|(x, y, value)| {
            let fill = match value {
                Some(r) => colormap.get_color_normalized(*r, -1.0, 1.0),
                None => UNDEFINED_FILL,
            };
            Rectangle::new(
                [
                    (SegmentValue::Exact(*x), SegmentValue::Exact(*y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                fill.filled(),
            )
        }))?;

        let centered = TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cells.iter().map(|(x, y, value)| {
            let label = match value {
                Some(r) => format!("{:.2}", r),
                None => "n/a".to_string(),
            };
            Text::new(
                label,
                (SegmentValue::CenterOf(*x), SegmentValue::CenterOf(*y)),
                centered.clone(),
            )
        }))?;
        root.present()?;
    }
    Ok(svg)
}

fn truncate_label(label: &str) -> String {
    const MAX: usize = 24;
    if label.chars().count() <= MAX {
        label.to_string()
    } else {
        let head: String = label.chars().take(MAX - 1).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryCount;

    fn fill_count(svg: &str, color: &str) -> usize {
        svg.to_uppercase().matches(&format!("FILL=\"{}\"", color)).count()
    }

    #[test]
    fn histogram_draws_one_bar_per_occupied_bin() {
        let svg = histogram("x", &[1.0, 2.0, 2.0, 3.0], 4).unwrap();
        assert!(svg.contains("<svg"));
        // bins 0, 2 and 3 hold values, bin 1 is empty
        assert_eq!(fill_count(&svg, "#4C72B0"), 3);
    }

    #[test]
    fn histogram_bins_cover_the_range() {
        let bins = Bins::of(&[1.0, 2.0, 2.0, 3.0], 4);
        assert_eq!(bins.counts, vec![1, 0, 2, 1]);
        assert_eq!(bins.start, 1.0);
        assert_eq!(bins.end(), 3.0);

        let constant = Bins::of(&[5.0, 5.0], HISTOGRAM_BINS);
        assert_eq!(constant.counts[0], 2);
    }

    #[test]
    fn histogram_handles_constant_and_empty_input() {
        assert!(histogram("c", &[5.0, 5.0], HISTOGRAM_BINS).unwrap().contains("</svg>"));
        assert!(histogram("e", &[], HISTOGRAM_BINS).unwrap().contains("no data"));
    }

    #[test]
    fn bars_escape_labels() {
        let table = CategoryTable {
            column: "c".to_string(),
            entries: vec![
                CategoryCount { value: "<b>".to_string(), count: 3 },
                CategoryCount { value: "plain".to_string(), count: 1 },
            ],
        };
        let svg = category_bars(&table).unwrap();
        assert!(svg.contains("&lt;b&gt;"));
        assert!(!svg.contains("<b>"));
        assert_eq!(fill_count(&svg, "#4C72B0"), 2);
    }

    #[test]
    fn heatmap_marks_undefined_cells() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".to_string(), "b".to_string()],
            values: vec![vec![Some(1.0), None], vec![None, Some(1.0)]],
        };
        let svg = correlation_heatmap(&matrix).unwrap();
        assert_eq!(svg.matches("n/a").count(), 2);
        assert_eq!(fill_count(&svg, "#B40426"), 2);
        assert_eq!(fill_count(&svg, "#CCCCCC"), 2);
    }

    #[test]
    fn missing_matrix_samples_large_frames() {
        let n_rows = 1000;
        let mask: Vec<bool> = (0..n_rows).map(|i| i % 2 == 0).collect();
        let svg = missing_matrix(&["x".to_string()], &[mask], n_rows).unwrap();
        // every sampled row index is even, so every drawn cell is missing
        assert_eq!(fill_count(&svg, "#222222"), MAX_MATRIX_ROWS);
    }

    #[test]
    fn missing_matrix_of_small_frame_draws_only_gaps() {
        let masks = vec![vec![false, true, false], vec![true, true, false]];
        let svg = missing_matrix(&["a".to_string(), "b".to_string()], &masks, 3).unwrap();
        assert_eq!(fill_count(&svg, "#222222"), 3);
    }
}

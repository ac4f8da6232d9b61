//! Text charts for terminal output
//!
//! Line-of-points charts with the critical zone drawn as two horizontal
//! guide lines.

use crate::config::CriticalZone;

const POINT: char = '*';
const GUIDE: char = '-';

/// Chart dimensions in characters
#[derive(Debug, Clone, Copy)]
pub struct ChartSize {
    pub width: usize,
    pub height: usize,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 72,
            height: 16,
        }
    }
}

/// Render `ys` against `xs` with guide lines at the critical-zone bounds
///
/// Points are bucketed into columns by position; each column shows the mean
/// of its bucket. The y range always includes both guide lines.
pub fn render_chart(title: &str, xs: &[f64], ys: &[f64], zone: &CriticalZone, size: ChartSize) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&"=".repeat(title.chars().count()));
    out.push('\n');

    let n = xs.len().min(ys.len());
    if n == 0 || size.width == 0 || size.height < 2 {
        out.push_str("(no data)\n");
        return out;
    }

    let min_val = ys[..n].iter().fold(zone.lower, |a, &b| a.min(b));
    let max_val = ys[..n].iter().fold(zone.upper, |a, &b| a.max(b));
    let range = if (max_val - min_val).abs() > 1e-10 {
        max_val - min_val
    } else {
        1.0
    };

    let rows = size.height;
    let row_of = |value: f64| -> usize {
        let normalized = (max_val - value) / range;
        ((normalized * (rows - 1) as f64).round() as usize).min(rows - 1)
    };

    let width = size.width.min(n);
    let mut grid = vec![vec![' '; width]; rows];

    for guide in [zone.lower, zone.upper] {
        let r = row_of(guide);
        for cell in grid[r].iter_mut() {
            *cell = GUIDE;
        }
    }

    for col in 0..width {
        let start = col * n / width;
        let end = ((col + 1) * n / width).max(start + 1);
        let bucket = &ys[start..end];
        let mean = bucket.iter().sum::<f64>() / bucket.len() as f64;
        grid[row_of(mean)][col] = POINT;
    }

    let label_width = 8;
    for (r, line) in grid.iter().enumerate() {
        let value = if r == row_of(zone.lower) {
            Some(zone.lower)
        } else if r == row_of(zone.upper) {
            Some(zone.upper)
        } else if r == 0 || r == rows - 1 {
            Some(max_val - range * r as f64 / (rows - 1) as f64)
        } else {
            None
        };
        let label = match value {
            Some(v) => format!("{:>width$.1}", v, width = label_width),
            None => " ".repeat(label_width),
        };
        out.push_str(&label);
        out.push_str(" |");
        out.extend(line.iter());
        out.push('\n');
    }

    out.push_str(&" ".repeat(label_width));
    out.push_str(" +");
    out.push_str(&"-".repeat(width));
    out.push('\n');

    let first = format!("{}", xs[0]);
    let last = format!("{}", xs[n - 1]);
    let gap = (width + 2).saturating_sub(first.len() + last.len());
    out.push_str(&" ".repeat(label_width));
    out.push_str(&first);
    out.push_str(&" ".repeat(gap));
    out.push_str(&last);
    out.push('\n');

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_points_and_guides() {
        let xs: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let ys: Vec<f64> = (0..50).map(|i| 40.0 - i as f64 * 0.5).collect();
        let chart = render_chart("EGT", &xs, &ys, &CriticalZone::default(), ChartSize::default());

        assert!(chart.starts_with("EGT\n===\n"));
        assert!(chart.contains(POINT));
        // both guide rows are labelled
        assert!(chart.contains("12.0"));
        assert!(chart.contains("18.0"));
        assert!(chart.lines().last().unwrap().trim_end().ends_with("49"));
    }

    #[test]
    fn test_render_empty() {
        let chart = render_chart("Empty", &[], &[], &CriticalZone::default(), ChartSize::default());
        assert!(chart.contains("(no data)"));
    }

    #[test]
    fn test_render_height() {
        let size = ChartSize { width: 10, height: 6 };
        let chart = render_chart("T", &[1.0, 2.0], &[20.0, 30.0], &CriticalZone::default(), size);
        let plot_rows = chart.lines().filter(|l| l.contains(" |")).count();
        assert_eq!(plot_rows, 6);
    }
}

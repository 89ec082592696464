//! Scaling history series onto a character grid.

/// Shared byte unit for a panel, chosen from the largest value across all
/// of its series so both curves use one scale.
pub fn graph_unit(max: f64) -> (f64, &'static str) {
    const K: f64 = 1024.0;
    if max >= K * K * K * K {
        (K * K * K * K, "TB")
    } else if max >= K * K * K {
        (K * K * K, "GB")
    } else if max >= K * K {
        (K * K, "MB")
    } else if max >= K {
        (K, "KB")
    } else {
        (1.0, "B")
    }
}

pub fn series_max(series: &[&[f64]]) -> f64 {
    series
        .iter()
        .flat_map(|s| s.iter().copied())
        .fold(0.0, f64::max)
}

/// The most recent `width` points.
pub fn tail(series: &[f64], width: usize) -> &[f64] {
    &series[series.len().saturating_sub(width)..]
}

/// Character grid of plotted series. `cells[row][col]` holds the index of
/// the series drawn there; row 0 is the top.
#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    pub width: usize,
    pub height: usize,
    pub max: f64,
    pub cells: Vec<Vec<Option<usize>>>,
}

/// Plot series right-aligned into `width` x `height`, scaled to the larger
/// of the observed maximum and `min_max`. Consecutive points in a series
/// are joined vertically so steep changes stay visible.
pub fn plot(series: &[&[f64]], width: usize, height: usize, min_max: f64) -> Chart {
    let width = width.max(1);
    let height = height.max(1);
    let max = series_max(series).max(min_max).max(f64::MIN_POSITIVE);
    let mut cells = vec![vec![None; width]; height];

    let row_of = |v: f64| -> usize {
        let frac = (v / max).clamp(0.0, 1.0);
        let level = (frac * (height - 1) as f64).round() as usize;
        height - 1 - level
    };

    for (idx, s) in series.iter().enumerate() {
        let points = tail(s, width);
        let offset = width - points.len();
        let mut prev_row: Option<usize> = None;
        for (i, v) in points.iter().enumerate() {
            let row = row_of(*v);
            let (lo, hi) = match prev_row {
                Some(p) => (p.min(row), p.max(row)),
                None => (row, row),
            };
            for cell_row in cells.iter_mut().take(hi + 1).skip(lo) {
                cell_row[offset + i] = Some(idx);
            }
            prev_row = Some(row);
        }
    }

    Chart {
        width,
        height,
        max,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_thresholds() {
        assert_eq!(graph_unit(1023.0).1, "B");
        assert_eq!(graph_unit(1024.0).1, "KB");
        assert_eq!(graph_unit(5.0 * 1024.0 * 1024.0).1, "MB");
        assert_eq!(graph_unit(2.0 * 1024.0 * 1024.0 * 1024.0).1, "GB");
        assert_eq!(graph_unit(1024f64.powi(4)).1, "TB");
    }

    #[test]
    fn shared_unit_follows_larger_series() {
        let rx = [100.0, 200.0];
        let tx = [3.0 * 1024.0 * 1024.0];
        let (scale, unit) = graph_unit(series_max(&[&rx, &tx]));
        assert_eq!(unit, "MB");
        assert_eq!(scale, 1024.0 * 1024.0);
    }

    #[test]
    fn tail_keeps_latest_points() {
        let s = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(tail(&s, 2), &[3.0, 4.0]);
        assert_eq!(tail(&s, 10), &s);
    }

    #[test]
    fn plot_places_max_at_top_and_zero_at_bottom() {
        let s = [0.0, 10.0];
        let chart = plot(&[&s], 4, 5, 1.0);
        assert_eq!(chart.cells[4][2], Some(0));
        assert_eq!(chart.cells[0][3], Some(0));
        // joined vertically between the two points
        assert!((0..5).all(|r| chart.cells[r][3] == Some(0)));
        // left padding untouched
        assert!((0..5).all(|r| chart.cells[r][0].is_none()));
    }
}

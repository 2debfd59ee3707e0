// src/visualisation.rs

use crate::error::{DiffusionError, Result};
use crate::field::ScalarField2D;
use plotters::prelude::*;

fn plot_err<E: std::fmt::Display>(e: E) -> DiffusionError {
    DiffusionError::Plot(e.to_string())
}

/// Ramp anchors: background (blue), half strength (white), source (red).
const RAMP: [(f64, [f64; 3]); 3] = [
    (0.0, [40.0, 70.0, 200.0]),
    (0.5, [255.0, 255.0, 255.0]),
    (1.0, [200.0, 30.0, 30.0]),
];

/// Colour for concentration `c` on a diverging ramp spanning [lo, hi].
/// Values outside the range clamp; NaN is drawn as the midpoint.
fn conc_to_color(c: f64, lo: f64, hi: f64) -> RGBColor {
    let span = hi - lo;
    let s = if !c.is_finite() {
        0.5
    } else if span.is_finite() && span > 0.0 {
        ((c - lo) / span).clamp(0.0, 1.0)
    } else {
        c.clamp(0.0, 1.0)
    };

    let k = if s <= RAMP[1].0 { 0 } else { 1 };
    let ((s0, c0), (s1, c1)) = (RAMP[k], RAMP[k + 1]);
    let w = (s - s0) / (s1 - s0);
    let [r, g, b] = [0, 1, 2].map(|n| (c0[n] + w * (c1[n] - c0[n])).round() as u8);
    RGBColor(r, g, b)
}

/// Save the interior of the concentration field as a PNG heat map.
/// - x/y axes are interior cell indices
/// - colour encodes c over `range` (blue = low, white = mid, red = high)
pub fn save_field_png(field: &ScalarField2D, range: (f64, f64), filename: &str) -> Result<()> {
    let g = field.grid;
    let h = g.halo;
    let w = (g.nx - 2 * h) as i32;
    let ht = (g.ny - 2 * h) as i32;

    let root = BitMapBackend::new(filename, (800, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(40)
        .caption(
            format!("concentration ({:.2} blue → {:.2} red)", range.0, range.1),
            ("sans-serif", 20),
        )
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..w, 0..ht)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x (cell index)")
        .y_desc("y (cell index)")
        .axis_desc_style(("sans-serif", 15))
        .draw()
        .map_err(plot_err)?;

    // One coloured rectangle per interior cell
    chart
        .draw_series((0..ht).flat_map(|j| {
            let row = field.row(j as usize + h);
            (0..w).map(move |i| {
                let color = conc_to_color(row[i as usize + h], range.0, range.1);
                Rectangle::new([(i, j), (i + 1, j + 1)], color.filled())
            })
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Plot the mean squared residual against simulated time.
pub fn save_residual_plot(times: &[f64], rss: &[f64], filename: &str) -> Result<()> {
    let points: Vec<(f64, f64)> = times
        .iter()
        .zip(rss)
        .map(|(&t, &r)| (t, r))
        .filter(|(t, r)| t.is_finite() && r.is_finite())
        .collect();
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Ok(());
    };

    let (t_min, mut t_max) = (first.0, last.0);
    if t_max <= t_min {
        t_max = t_min + 1.0;
    }

    let y_max = points.iter().map(|p| p.1).fold(0.0_f64, f64::max);
    let y_max = if y_max > 0.0 { 1.1 * y_max } else { 1.0 };

    let root = BitMapBackend::new(filename, (1024, 768)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption("Residual vs analytical solution", ("sans-serif", 30))
        .set_left_and_bottom_label_area_size(60)
        .build_cartesian_2d(t_min..t_max, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("simulated time")
        .y_desc("mean squared residual")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLACK))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_ramp_endpoints() {
        assert_eq!(conc_to_color(0.0, 0.0, 1.0), RGBColor(40, 70, 200));
        assert_eq!(conc_to_color(0.5, 0.0, 1.0), RGBColor(255, 255, 255));
        assert_eq!(conc_to_color(1.0, 0.0, 1.0), RGBColor(200, 30, 30));
        assert_eq!(conc_to_color(0.75, 0.0, 1.0), RGBColor(228, 143, 143));
        // out of range clamps, degenerate range falls back to [0, 1]
        assert_eq!(conc_to_color(7.0, 0.0, 1.0), RGBColor(200, 30, 30));
        assert_eq!(conc_to_color(1.0, 0.3, 0.3), RGBColor(200, 30, 30));
        assert_eq!(conc_to_color(f64::NAN, 0.0, 1.0), RGBColor(255, 255, 255));
    }
}

use crate::types::{is_time_column, Column, ColumnTable, L3Error, L3Result};
use serde::{Deserialize, Serialize};

/// Interpolation method selection for the resampling engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpMethod {
    /// Piecewise linear, used for the lower-rate GPS and attitude channels
    Linear,
    /// Natural cubic spline, used for the radiometric time series
    Cubic,
}

fn check_domain(x: &[f64], target: f64) -> L3Result<()> {
    let min = x[0];
    let max = x[x.len() - 1];
    if target < min || target > max {
        return Err(L3Error::Extrapolation { target, min, max });
    }
    Ok(())
}

/// Index of the interval [x[i], x[i+1]] containing the target.
/// Assumes the domain check already passed.
fn locate(x: &[f64], target: f64) -> usize {
    let upper = x.partition_point(|&v| v < target);
    upper.clamp(1, x.len() - 1) - 1
}

/// Piecewise-linear interpolation of `y(x)` evaluated at `new_x`.
///
/// Targets outside `[x[0], x[n-1]]` are a hard error; the pipeline selects
/// target bases bounded by the source windows, so extrapolation here always
/// means corrupt inputs.
pub fn interp_linear(x: &[f64], y: &[f64], new_x: &[f64]) -> L3Result<Vec<f64>> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(L3Error::Processing(format!(
            "linear interpolation needs at least 2 matched samples, got {}/{}",
            x.len(),
            y.len()
        )));
    }
    let mut out = Vec::with_capacity(new_x.len());
    for &target in new_x {
        check_domain(x, target)?;
        let i = locate(x, target);
        let span = x[i + 1] - x[i];
        let weight = (target - x[i]) / span;
        out.push(y[i] * (1.0 - weight) + y[i + 1] * weight);
    }
    Ok(out)
}

/// Natural cubic spline through all source points.
///
/// Second derivatives vanish at both ends; with only two knots the curve
/// degenerates to the connecting line. Knots must be strictly increasing.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
}

impl CubicSpline {
    pub fn fit(x: &[f64], y: &[f64]) -> L3Result<Self> {
        let n = x.len();
        if n != y.len() || n < 2 {
            return Err(L3Error::Processing(format!(
                "spline fit needs at least 2 matched knots, got {}/{}",
                x.len(),
                y.len()
            )));
        }
        if !x.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(L3Error::Processing(
                "spline knots must be strictly increasing".to_string(),
            ));
        }

        let h: Vec<f64> = x.windows(2).map(|pair| pair[1] - pair[0]).collect();

        // Thomas algorithm for the natural-boundary tridiagonal system
        let mut mu = vec![0.0; n];
        let mut z = vec![0.0; n];
        for i in 1..n - 1 {
            let alpha =
                3.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
            let l = 2.0 * (x[i + 1] - x[i - 1]) - h[i - 1] * mu[i - 1];
            mu[i] = h[i] / l;
            z[i] = (alpha - h[i - 1] * z[i - 1]) / l;
        }

        let mut c = vec![0.0; n];
        for i in (1..n - 1).rev() {
            c[i] = z[i] - mu[i] * c[i + 1];
        }

        let mut b = vec![0.0; n - 1];
        let mut d = vec![0.0; n - 1];
        for i in 0..n - 1 {
            b[i] = (y[i + 1] - y[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0;
            d[i] = (c[i + 1] - c[i]) / (3.0 * h[i]);
        }

        Ok(CubicSpline {
            x: x.to_vec(),
            y: y.to_vec(),
            b,
            c,
            d,
        })
    }

    /// Evaluate the spline at one point inside the knot span
    pub fn eval(&self, target: f64) -> L3Result<f64> {
        check_domain(&self.x, target)?;
        let i = locate(&self.x, target);
        let dx = target - self.x[i];
        Ok(self.y[i] + dx * (self.b[i] + dx * (self.c[i] + dx * self.d[i])))
    }

    pub fn eval_many(&self, targets: &[f64]) -> L3Result<Vec<f64>> {
        targets.iter().map(|&t| self.eval(t)).collect()
    }
}

/// Resample every non-metadata numeric column of `table` from the source
/// time base onto the target time base, column by column.
///
/// `Datetag`/`Timetag2` are never interpolated; the caller attaches the
/// target's own authoritative stamp pair afterwards. Text columns carry no
/// resampleable signal (hemisphere flags are consumed during coordinate
/// conversion) and are dropped.
pub fn resample(
    table: &ColumnTable,
    source_seconds: &[f64],
    target_seconds: &[f64],
    method: InterpMethod,
) -> L3Result<ColumnTable> {
    let mut out = ColumnTable::new();
    for name in table.names() {
        if is_time_column(name) {
            continue;
        }
        let values = match table.get(name) {
            Some(Column::Float(v)) => v,
            _ => continue,
        };
        let resampled = match method {
            InterpMethod::Linear => interp_linear(source_seconds, values, target_seconds)?,
            InterpMethod::Cubic => {
                CubicSpline::fit(source_seconds, values)?.eval_many(target_seconds)?
            }
        };
        out.insert_float(name, resampled);
    }
    Ok(out)
}

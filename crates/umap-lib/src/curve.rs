/*!
Low-dimensional kernel calibration.

The layout optimizer models membership strength in the embedding space as
`1 / (1 + a * d^(2b))`. The pair `(a, b)` is chosen so this curve matches the
piecewise target `x <= min_dist -> 1`, `x > min_dist -> exp(-(x - min_dist)
/ spread)` in the least-squares sense over `[0, 3 * spread]`. A short
Gauss-Newton iteration is cheap enough to run once per fit, so no
precomputed lookup tables are needed.
*/

use nalgebra::{Matrix2, Vector2};

use crate::error::UmapError;

/// Sample count over the fitting interval.
const N_SAMPLES: usize = 300;

/// Gauss-Newton iteration cap; convergence is typically reached in ~20.
const MAX_ITER: usize = 100;

/// Fit `(a, b)` of the low-dimensional kernel from `(spread, min_dist)`.
///
/// # Arguments
///
/// * `spread` - scale of the target falloff, in `[0.5, 1.5]`
/// * `min_dist` - plateau radius, in `(0, spread)`
///
/// # Errors
///
/// Configuration error when either parameter is outside its legal range.
pub fn find_ab_params(spread: f32, min_dist: f32) -> Result<(f32, f32), UmapError> {
    if !(0.5..=1.5).contains(&spread) {
        return Err(UmapError::invalid(
            "spread",
            format!("must lie in [0.5, 1.5], got {spread}"),
        ));
    }
    if min_dist <= 0.0 || min_dist >= spread {
        return Err(UmapError::invalid(
            "min_dist",
            format!("must lie in (0, spread), got {min_dist} with spread {spread}"),
        ));
    }

    let spread = spread as f64;
    let min_dist = min_dist as f64;

    // Sample the target curve. x = 0 is skipped: both curves equal 1 there
    // and the b-derivative is undefined.
    let xs: Vec<f64> = (1..N_SAMPLES)
        .map(|i| i as f64 * (3.0 * spread) / (N_SAMPLES - 1) as f64)
        .collect();
    let ys: Vec<f64> = xs
        .iter()
        .map(|&x| {
            if x <= min_dist {
                1.0
            } else {
                (-(x - min_dist) / spread).exp()
            }
        })
        .collect();

    let mut a = 1.0_f64;
    let mut b = 1.0_f64;
    let mut sse = sum_squared_error(&xs, &ys, a, b);

    for _ in 0..MAX_ITER {
        // Normal equations of the linearized problem.
        let mut jtj = Matrix2::<f64>::zeros();
        let mut jtr = Vector2::<f64>::zeros();
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            let xp = x.powf(2.0 * b);
            let denom = 1.0 + a * xp;
            let f = 1.0 / denom;
            let r = f - y;
            let df_da = -xp / (denom * denom);
            let df_db = -2.0 * a * xp * x.ln() / (denom * denom);
            jtj[(0, 0)] += df_da * df_da;
            jtj[(0, 1)] += df_da * df_db;
            jtj[(1, 0)] += df_db * df_da;
            jtj[(1, 1)] += df_db * df_db;
            jtr[0] += df_da * r;
            jtr[1] += df_db * r;
        }
        let step = match jtj.try_inverse() {
            Some(inv) => inv * (-jtr),
            None => break,
        };

        // Backtrack until the step actually reduces the error and keeps the
        // parameters positive.
        let mut scale = 1.0_f64;
        let mut improved = false;
        for _ in 0..30 {
            let na = a + scale * step[0];
            let nb = b + scale * step[1];
            if na > 0.0 && nb > 0.0 {
                let nsse = sum_squared_error(&xs, &ys, na, nb);
                if nsse < sse {
                    a = na;
                    b = nb;
                    sse = nsse;
                    improved = true;
                    break;
                }
            }
            scale /= 2.0;
        }
        if !improved || (step[0].abs() + step[1].abs()) * scale < 1e-12 {
            break;
        }
    }

    Ok((a as f32, b as f32))
}

fn sum_squared_error(xs: &[f64], ys: &[f64], a: f64, b: f64) -> f64 {
    xs.iter()
        .zip(ys.iter())
        .map(|(&x, &y)| {
            let f = 1.0 / (1.0 + a * x.powf(2.0 * b));
            (f - y) * (f - y)
        })
        .sum()
}

use tracing::trace;

use crate::alg::{PointStatus, RpcModel, SolverContext, TransformSolver};
use crate::cpl::CslStringList;
use crate::errors::{GdalError, Result};

/// Pixel error threshold used when the caller passes `<= 0`.
pub const DEFAULT_PIXEL_ERROR_THRESHOLD: f64 = 0.1;

/// Inverse iterations used when `RPC_MAX_ITERATIONS` is not set.
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

const MIN_DENOMINATOR: f64 = 1e-12;

/// Pure Rust RPC00B evaluator.
///
/// Forward (ground to image) evaluates the polynomials directly; the inverse
/// runs Newton iterations with a numerical Jacobian.
///
/// Options:
/// * `RPC_HEIGHT` - offset added to every input height
/// * `RPC_HEIGHT_SCALE` - factor applied to every input height
/// * `RPC_MAX_ITERATIONS` - inverse iteration cap, default 20
///
/// `RPC_DEM` needs a DEM reader and is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRpcSolver;

impl NativeRpcSolver {
    pub fn new() -> Self {
        NativeRpcSolver
    }
}

fn option_f64(options: &CslStringList, key: &str, default: f64) -> Result<f64> {
    match options.fetch_name_value(key) {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| GdalError::BadArgument(format!("{key} must be a number, got '{v}'"))),
    }
}

impl TransformSolver for NativeRpcSolver {
    fn create(
        &self,
        model: &RpcModel,
        reversed: bool,
        pixel_error_threshold: f64,
        options: &CslStringList,
    ) -> Result<Box<dyn SolverContext>> {
        model.validate()?;
        if options.fetch_name_value("RPC_DEM").is_some() {
            return Err(GdalError::BadArgument(
                "RPC_DEM requires the GDAL solver".to_string(),
            ));
        }
        let max_iterations = match options.fetch_name_value("RPC_MAX_ITERATIONS") {
            None => DEFAULT_MAX_ITERATIONS,
            Some(v) => v.trim().parse().map_err(|_| {
                GdalError::BadArgument(format!("RPC_MAX_ITERATIONS must be a count, got '{v}'"))
            })?,
        };
        let threshold = if pixel_error_threshold > 0.0 {
            pixel_error_threshold
        } else {
            DEFAULT_PIXEL_ERROR_THRESHOLD
        };

        Ok(Box::new(NativeRpcContext {
            model: model.clone(),
            reversed,
            threshold,
            height: option_f64(options, "RPC_HEIGHT", 0.0)?,
            height_scale: option_f64(options, "RPC_HEIGHT_SCALE", 1.0)?,
            max_iterations,
        }))
    }
}

#[derive(Debug)]
struct NativeRpcContext {
    model: RpcModel,
    reversed: bool,
    threshold: f64,
    height: f64,
    height_scale: f64,
    max_iterations: usize,
}

/// RPC00B term order.
fn terms(l: f64, p: f64, h: f64) -> [f64; 20] {
    [
        1.0,
        l,
        p,
        h,
        l * p,
        l * h,
        p * h,
        l * l,
        p * p,
        h * h,
        p * l * h,
        l * l * l,
        l * p * p,
        l * h * h,
        l * l * p,
        p * p * p,
        p * h * h,
        l * l * h,
        p * p * h,
        h * h * h,
    ]
}

fn poly(coeffs: &[f64; 20], terms: &[f64; 20]) -> f64 {
    coeffs.iter().zip(terms).map(|(c, t)| c * t).sum()
}

impl NativeRpcContext {
    /// Ground (lon, lat, height) to image (pixel, line), pixel-corner convention.
    fn ground_to_image(&self, lon: f64, lat: f64, height: f64) -> Option<(f64, f64)> {
        if !(lon.is_finite() && lat.is_finite() && height.is_finite()) {
            return None;
        }
        let m = &self.model;
        let t = terms(
            (lon - m.long_off) / m.long_scale,
            (lat - m.lat_off) / m.lat_scale,
            (height - m.height_off) / m.height_scale,
        );
        let line_den = poly(&m.line_den_coeff, &t);
        let samp_den = poly(&m.samp_den_coeff, &t);
        if line_den.abs() < MIN_DENOMINATOR || samp_den.abs() < MIN_DENOMINATOR {
            return None;
        }
        let line = poly(&m.line_num_coeff, &t) / line_den * m.line_scale + m.line_off;
        let samp = poly(&m.samp_num_coeff, &t) / samp_den * m.samp_scale + m.samp_off;
        let image = (samp + 0.5, line + 0.5);
        (image.0.is_finite() && image.1.is_finite()).then_some(image)
    }

    /// Image (pixel, line) to ground (lon, lat) at `height`.
    ///
    /// On failure the status comes with the last estimate.
    fn image_to_ground(&self, pixel: f64, line: f64, height: f64) -> (PointStatus, f64, f64) {
        let m = &self.model;
        let (mut lon, mut lat) = (m.long_off, m.lat_off);
        if !(pixel.is_finite() && line.is_finite() && height.is_finite()) {
            return (PointStatus::OutOfDomain, pixel, line);
        }
        let d_lon = m.long_scale.abs() * 1e-6;
        let d_lat = m.lat_scale.abs() * 1e-6;

        for iteration in 0..=self.max_iterations {
            let Some((px, ln)) = self.ground_to_image(lon, lat, height) else {
                return (PointStatus::OutOfDomain, lon, lat);
            };
            let (err_x, err_y) = (px - pixel, ln - line);
            if err_x.abs() <= self.threshold && err_y.abs() <= self.threshold {
                trace!(iteration, err_x, err_y, "rpc inverse converged");
                return (PointStatus::Success, lon, lat);
            }
            if iteration == self.max_iterations {
                break;
            }

            let (Some((px_lon, ln_lon)), Some((px_lat, ln_lat))) = (
                self.ground_to_image(lon + d_lon, lat, height),
                self.ground_to_image(lon, lat + d_lat, height),
            ) else {
                return (PointStatus::OutOfDomain, lon, lat);
            };
            let j00 = (px_lon - px) / d_lon;
            let j01 = (px_lat - px) / d_lat;
            let j10 = (ln_lon - ln) / d_lon;
            let j11 = (ln_lat - ln) / d_lat;
            let det = j00 * j11 - j01 * j10;
            if det.abs() < f64::EPSILON || !det.is_finite() {
                return (PointStatus::NoConvergence, lon, lat);
            }
            lon -= (j11 * err_x - j01 * err_y) / det;
            lat -= (j00 * err_y - j10 * err_x) / det;
        }
        (PointStatus::NoConvergence, lon, lat)
    }
}

impl SolverContext for NativeRpcContext {
    fn transform(
        &mut self,
        inverse: bool,
        x: &mut [f64],
        y: &mut [f64],
        z: &mut [f64],
        status: &mut [PointStatus],
    ) -> Result<()> {
        let image_to_ground = self.reversed != inverse;
        for i in 0..x.len() {
            let height = z[i] * self.height_scale + self.height;
            status[i] = if image_to_ground {
                let (s, lon, lat) = self.image_to_ground(x[i], y[i], height);
                x[i] = lon;
                y[i] = lat;
                s
            } else {
                match self.ground_to_image(x[i], y[i], height) {
                    Some((pixel, line)) => {
                        x[i] = pixel;
                        y[i] = line;
                        PointStatus::Success
                    }
                    None => PointStatus::OutOfDomain,
                }
            };
        }
        Ok(())
    }
}

use std::fmt::{Debug, Display, Formatter};

use tracing::{debug, error};

use crate::alg::{NativeRpcSolver, PointStatus, RpcModel, SolverContext, TransformSolver};
use crate::cpl::CslStringList;
use crate::errors::{GdalError, Result};

/// Why a single point failed to transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    NoConvergence,
    OutOfDomain,
    Failed,
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FailureReason::NoConvergence => "no convergence",
            FailureReason::OutOfDomain => "out of domain",
            FailureReason::Failed => "failed",
        })
    }
}

/// One failed point of a batch, keyed by its position and original input.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFailure {
    pub index: usize,
    pub input: (f64, f64, f64),
    pub reason: FailureReason,
}

/// Every failed point of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformFailures {
    failures: Vec<PointFailure>,
    total: usize,
}

impl TransformFailures {
    /// Number of failed points.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Size of the batch the failures come from.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointFailure> {
        self.failures.iter()
    }

    /// Indices of the failed points, ascending.
    pub fn indices(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }

    pub fn into_vec(self) -> Vec<PointFailure> {
        self.failures
    }
}

impl<'a> IntoIterator for &'a TransformFailures {
    type Item = &'a PointFailure;
    type IntoIter = std::slice::Iter<'a, PointFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for TransformFailures {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        const SHOWN: usize = 5;
        write!(
            f,
            "rpc transform failed for {} of {} points",
            self.failures.len(),
            self.total
        )?;
        for (i, failure) in self.failures.iter().take(SHOWN).enumerate() {
            let (x, y, z) = failure.input;
            let sep = if i == 0 { ": " } else { ", " };
            write!(
                f,
                "{sep}#{} ({x}, {y}, {z}) {}",
                failure.index, failure.reason
            )?;
        }
        if self.failures.len() > SHOWN {
            write!(f, ", and {} more", self.failures.len() - SHOWN)?;
        }
        Ok(())
    }
}

/// Output of one batch transform: every point, successful or not, plus the failures.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTransform {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    /// `success[i]` is `false` for every point listed in `failures`.
    pub success: Vec<bool>,
    pub failures: TransformFailures,
}

impl BatchTransform {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn failures(&self) -> &TransformFailures {
        &self.failures
    }

    /// Output point `index` as (x, y, z).
    pub fn point(&self, index: usize) -> Option<(f64, f64, f64)> {
        Some((
            *self.x.get(index)?,
            *self.y.get(index)?,
            *self.z.get(index)?,
        ))
    }

    /// Turns any failure into [`GdalError::PartialTransform`].
    pub fn check(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(GdalError::PartialTransform(self.failures))
        }
    }
}

/// A batch RPC transformer.
///
/// Holds one solver context, built once and reused for every batch. The
/// context is released by [`release`](RpcTransformer::release) or on drop;
/// transforming afterwards fails with [`GdalError::ContextReleased`].
///
/// ```
/// use gdal_rasterio::alg::{RpcModel, RpcTransformer};
/// use gdal_rasterio::cpl::CslStringList;
///
/// # fn run(md: &CslStringList) -> gdal_rasterio::errors::Result<()> {
/// let model = RpcModel::extract(md)?;
/// let mut transformer = RpcTransformer::new(&model, false, 0.1, &CslStringList::new())?;
/// let out = transformer.transform(&[10.05], &[45.05], &[0.0], false)?;
/// for failure in out.failures() {
///     eprintln!("point {} did not transform: {}", failure.index, failure.reason);
/// }
/// # Ok(())
/// # }
/// ```
pub struct RpcTransformer {
    inner: Option<Box<dyn SolverContext>>,
    reversed: bool,
}

impl Debug for RpcTransformer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcTransformer")
            .field("reversed", &self.reversed)
            .field("released", &self.inner.is_none())
            .finish()
    }
}

impl RpcTransformer {
    /// Builds a transformer on the pure Rust solver.
    ///
    /// # Arguments
    /// * `model` - the RPC model
    /// * `reversed` - `true` makes image to ground the forward direction
    /// * `pixel_error_threshold` - inverse convergence bound in pixels, `<= 0` for the default
    /// * `options` - solver options such as `RPC_HEIGHT`
    pub fn new(
        model: &RpcModel,
        reversed: bool,
        pixel_error_threshold: f64,
        options: &CslStringList,
    ) -> Result<Self> {
        Self::with_solver(
            &NativeRpcSolver::new(),
            model,
            reversed,
            pixel_error_threshold,
            options,
        )
    }

    /// Extracts the model from flat RPC metadata and builds a transformer on the pure Rust solver.
    pub fn from_metadata(
        md: &CslStringList,
        reversed: bool,
        pixel_error_threshold: f64,
        options: &CslStringList,
    ) -> Result<Self> {
        Self::new(&RpcModel::extract(md)?, reversed, pixel_error_threshold, options)
    }

    /// Builds a transformer on any solver.
    pub fn with_solver<S: TransformSolver + ?Sized>(
        solver: &S,
        model: &RpcModel,
        reversed: bool,
        pixel_error_threshold: f64,
        options: &CslStringList,
    ) -> Result<Self> {
        let inner = solver.create(model, reversed, pixel_error_threshold, options)?;
        debug!(reversed, pixel_error_threshold, "rpc transformer created");
        Ok(RpcTransformer {
            inner: Some(inner),
            reversed,
        })
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    /// Transforms a batch of points.
    ///
    /// Without `reversed` the context's forward direction applies; with it,
    /// the opposite one. Points that fail keep the solver's best effort in the
    /// output, are marked in `success` and listed in `failures`; they do not fail
    /// the call.
    ///
    /// Fails with [`GdalError::BadArgument`] when the slices differ in length
    /// and [`GdalError::ContextReleased`] after [`release`](Self::release).
    pub fn transform(
        &mut self,
        x: &[f64],
        y: &[f64],
        z: &[f64],
        reversed: bool,
    ) -> Result<BatchTransform> {
        let Some(ctx) = self.inner.as_mut() else {
            error!("rpc transform called on a released context");
            return Err(GdalError::ContextReleased);
        };
        let n = x.len();
        if y.len() != n || z.len() != n {
            return Err(GdalError::BadArgument(format!(
                "x, y, z must have the same length, got {}, {}, {}",
                n,
                y.len(),
                z.len()
            )));
        }

        let mut out_x = x.to_vec();
        let mut out_y = y.to_vec();
        let mut out_z = z.to_vec();
        let mut status = vec![PointStatus::Success; n];
        if n > 0 {
            ctx.transform(reversed, &mut out_x, &mut out_y, &mut out_z, &mut status)?;
        }

        let failures: Vec<PointFailure> = status
            .iter()
            .enumerate()
            .filter_map(|(index, s)| {
                let reason = match s {
                    PointStatus::Success => return None,
                    PointStatus::NoConvergence => FailureReason::NoConvergence,
                    PointStatus::OutOfDomain => FailureReason::OutOfDomain,
                    PointStatus::Failed => FailureReason::Failed,
                };
                Some(PointFailure {
                    index,
                    input: (x[index], y[index], z[index]),
                    reason,
                })
            })
            .collect();
        debug!(
            points = n,
            reversed,
            failures = failures.len(),
            "rpc batch transform"
        );

        Ok(BatchTransform {
            x: out_x,
            y: out_y,
            z: out_z,
            success: status.iter().map(PointStatus::is_success).collect(),
            failures: TransformFailures {
                failures,
                total: n,
            },
        })
    }

    /// Transforms one point, failing unless it succeeds.
    pub fn transform_point(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        reversed: bool,
    ) -> Result<(f64, f64, f64)> {
        let out = self.transform(&[x], &[y], &[z], reversed)?.check()?;
        Ok((out.x[0], out.y[0], out.z[0]))
    }

    /// Destroys the solver context. Calling it again does nothing.
    pub fn release(&mut self) {
        if self.inner.take().is_some() {
            debug!("rpc transformer released");
        }
    }
}

impl Drop for RpcTransformer {
    fn drop(&mut self) {
        self.release();
    }
}

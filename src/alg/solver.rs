use crate::alg::RpcModel;
use crate::cpl::CslStringList;
use crate::errors::Result;

/// Outcome of transforming one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointStatus {
    #[default]
    Success,
    /// The iterative inverse did not reach the pixel error threshold.
    NoConvergence,
    /// The point is outside where the model can be evaluated.
    OutOfDomain,
    /// The solver reported a failure without saying why.
    Failed,
}

impl PointStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PointStatus::Success)
    }
}

/// Builds transform contexts from RPC models.
pub trait TransformSolver {
    /// Creates a context for `model`.
    ///
    /// `reversed` swaps the context's forward direction (ground to image) for
    /// image to ground. `pixel_error_threshold` bounds the inverse iteration;
    /// a value `<= 0` selects the solver's default. `options` are solver
    /// specific `KEY=VALUE` pairs.
    fn create(
        &self,
        model: &RpcModel,
        reversed: bool,
        pixel_error_threshold: f64,
        options: &CslStringList,
    ) -> Result<Box<dyn SolverContext>>;
}

/// A live transform context. Dropping it destroys the context.
pub trait SolverContext: Send {
    /// Transforms the points in place and records one status per point.
    ///
    /// `inverse` runs the opposite of the context's forward direction. All
    /// slices have the same length. Failed points hold the solver's best effort.
    fn transform(
        &mut self,
        inverse: bool,
        x: &mut [f64],
        y: &mut [f64],
        z: &mut [f64],
        status: &mut [PointStatus],
    ) -> Result<()>;
}

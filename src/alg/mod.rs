//! Batch geometric transformers
//!
//! An [`RpcTransformer`] applies an [`RpcModel`] to whole arrays of points.
//! Points that fail are collected in [`TransformFailures`] instead of failing
//! the batch. The numeric work sits behind the [`TransformSolver`] seam:
//! [`NativeRpcSolver`] always, [`GdalRpcSolver`] with the `gdal` feature.

#[cfg(feature = "gdal")]
mod gdal;
mod native;
mod rpc;
mod solver;
mod transform;

#[cfg(feature = "gdal")]
pub use gdal::GdalRpcSolver;
pub use native::{NativeRpcSolver, DEFAULT_MAX_ITERATIONS, DEFAULT_PIXEL_ERROR_THRESHOLD};
pub use rpc::{
    RpcModel, RPC_COEFF_COUNT, RPC_DOMAIN, RPC_LINE_DEN_COEFF, RPC_LINE_NUM_COEFF,
    RPC_REQUIRED_KEYS, RPC_SAMP_DEN_COEFF, RPC_SAMP_NUM_COEFF,
};
pub use solver::{PointStatus, SolverContext, TransformSolver};
pub use transform::{
    BatchTransform, FailureReason, PointFailure, RpcTransformer, TransformFailures,
};

#[cfg(test)]
mod tests;

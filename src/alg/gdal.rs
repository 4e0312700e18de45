use libc::{c_int, c_void};

use crate::alg::{PointStatus, RpcModel, SolverContext, TransformSolver};
use crate::cpl::CslStringList;
use crate::errors::{GdalError, Result};
use crate::utils::_last_cpl_err;

/// RPC solver backed by `GDALCreateRPCTransformerV2`.
///
/// Accepts every option GDAL documents for the RPC transformer, `RPC_DEM`
/// included. GDAL reports per-point success only, so failed points carry
/// [`PointStatus::Failed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalRpcSolver;

impl GdalRpcSolver {
    pub fn new() -> Self {
        GdalRpcSolver
    }
}

fn rpc_info(model: &RpcModel) -> gdal_sys::GDALRPCInfoV2 {
    gdal_sys::GDALRPCInfoV2 {
        dfLINE_OFF: model.line_off,
        dfSAMP_OFF: model.samp_off,
        dfLAT_OFF: model.lat_off,
        dfLONG_OFF: model.long_off,
        dfHEIGHT_OFF: model.height_off,
        dfLINE_SCALE: model.line_scale,
        dfSAMP_SCALE: model.samp_scale,
        dfLAT_SCALE: model.lat_scale,
        dfLONG_SCALE: model.long_scale,
        dfHEIGHT_SCALE: model.height_scale,
        adfLINE_NUM_COEFF: model.line_num_coeff,
        adfLINE_DEN_COEFF: model.line_den_coeff,
        adfSAMP_NUM_COEFF: model.samp_num_coeff,
        adfSAMP_DEN_COEFF: model.samp_den_coeff,
        dfMIN_LONG: model.min_long,
        dfMIN_LAT: model.min_lat,
        dfMAX_LONG: model.max_long,
        dfMAX_LAT: model.max_lat,
        dfERR_BIAS: model.err_bias,
        dfERR_RAND: model.err_rand,
    }
}

impl TransformSolver for GdalRpcSolver {
    fn create(
        &self,
        model: &RpcModel,
        reversed: bool,
        pixel_error_threshold: f64,
        options: &CslStringList,
    ) -> Result<Box<dyn SolverContext>> {
        model.validate()?;
        let info = rpc_info(model);
        let mut c_options = options.to_c_list()?;
        let c_transformer = unsafe {
            gdal_sys::GDALCreateRPCTransformerV2(
                &info,
                reversed as c_int,
                pixel_error_threshold,
                c_options.as_mut_ptr() as _,
            )
        };
        if c_transformer.is_null() {
            let msg = crate::utils::_last_null_pointer_err("GDALCreateRPCTransformerV2");
            return Err(GdalError::invalid_model(msg.to_string()));
        }
        Ok(Box::new(GdalRpcContext { c_transformer }))
    }
}

struct GdalRpcContext {
    c_transformer: *mut c_void,
}

// The transformer state is owned exclusively by this context and used from one thread at a time.
unsafe impl Send for GdalRpcContext {}

impl SolverContext for GdalRpcContext {
    fn transform(
        &mut self,
        inverse: bool,
        x: &mut [f64],
        y: &mut [f64],
        z: &mut [f64],
        status: &mut [PointStatus],
    ) -> Result<()> {
        let n = x.len();
        if y.len() != n || z.len() != n || status.len() != n {
            return Err(GdalError::BadArgument(
                "coordinate and status slices must have the same length".to_string(),
            ));
        }
        let point_count = c_int::try_from(n)
            .map_err(|_| GdalError::BadArgument(format!("{n} points exceed a C int")))?;

        let mut success: Vec<c_int> = vec![0; n];
        // GDAL's destination is the ground; forward here is ground to image.
        let rv = unsafe {
            gdal_sys::GDALRPCTransform(
                self.c_transformer,
                (!inverse) as c_int,
                point_count,
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                z.as_mut_ptr(),
                success.as_mut_ptr(),
            )
        };
        if rv == 0 && success.iter().all(|&s| s == 0) {
            let err = _last_cpl_err(gdal_sys::CPLErr::CE_Failure);
            if let GdalError::CplError { msg, .. } = &err {
                if !msg.is_empty() {
                    return Err(err);
                }
            }
        }
        for (s, &ok) in status.iter_mut().zip(&success) {
            *s = if ok != 0 {
                PointStatus::Success
            } else {
                PointStatus::Failed
            };
        }
        Ok(())
    }
}

impl Drop for GdalRpcContext {
    fn drop(&mut self) {
        unsafe { gdal_sys::GDALDestroyRPCTransformer(self.c_transformer) };
    }
}

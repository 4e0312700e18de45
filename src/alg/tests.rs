use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::alg::{
    FailureReason, PointStatus, RpcModel, RpcTransformer, SolverContext, TransformSolver,
    RPC_REQUIRED_KEYS, RPC_SAMP_DEN_COEFF,
};
use crate::assert_near;
use crate::cpl::CslStringList;
use crate::errors::{GdalError, Result};
use crate::metadata::Metadata;
use crate::raster::{GdalDataType, MemDataset};
use crate::test_utils::{init_tracing, linear_rpc_metadata};

/// Transforms nothing, counts calls and fails the listed points.
struct ScriptedSolver {
    calls: Arc<AtomicUsize>,
    fail: Vec<(usize, PointStatus)>,
}

struct ScriptedContext {
    calls: Arc<AtomicUsize>,
    fail: Vec<(usize, PointStatus)>,
}

impl ScriptedSolver {
    fn new(fail: Vec<(usize, PointStatus)>) -> Self {
        ScriptedSolver {
            calls: Arc::new(AtomicUsize::new(0)),
            fail,
        }
    }
}

impl TransformSolver for ScriptedSolver {
    fn create(
        &self,
        _model: &RpcModel,
        _reversed: bool,
        _pixel_error_threshold: f64,
        _options: &CslStringList,
    ) -> Result<Box<dyn SolverContext>> {
        Ok(Box::new(ScriptedContext {
            calls: Arc::clone(&self.calls),
            fail: self.fail.clone(),
        }))
    }
}

impl SolverContext for ScriptedContext {
    fn transform(
        &mut self,
        _inverse: bool,
        x: &mut [f64],
        _y: &mut [f64],
        _z: &mut [f64],
        status: &mut [PointStatus],
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for v in x.iter_mut() {
            *v += 1.0;
        }
        for &(i, s) in &self.fail {
            status[i] = s;
        }
        Ok(())
    }
}

fn linear_model() -> RpcModel {
    RpcModel::extract(&linear_rpc_metadata()).unwrap()
}

#[test]
fn test_missing_required_keys() {
    for key in RPC_REQUIRED_KEYS {
        let mut md = linear_rpc_metadata();
        md.remove(key);
        match RpcModel::extract(&md) {
            Err(GdalError::InvalidModel { key: Some(k), msg }) => {
                assert_eq!(k, key);
                assert_eq!(msg, format!("RPC metadata does not contain {key}"));
            }
            other => panic!("expected InvalidModel for {key}, got {other:?}"),
        }
    }
}

#[test]
fn test_missing_samp_den_names_key() {
    let mut md = linear_rpc_metadata();
    md.remove(RPC_SAMP_DEN_COEFF);
    let err = RpcTransformer::from_metadata(&md, false, 0.1, &CslStringList::new()).unwrap_err();
    assert!(err.to_string().contains("SAMP_DEN_COEFF"), "{err}");
}

#[test]
fn test_extract_defaults_and_units() -> Result<()> {
    let mut md = linear_rpc_metadata();
    md.remove("HEIGHT_OFF");
    md.remove("HEIGHT_SCALE");
    md.set_name_value("ERR_BIAS", "4.5 pixels")?;
    let model = RpcModel::extract(&md)?;

    assert_eq!(model.height_off, 0.0);
    assert_eq!(model.height_scale, 1.0);
    assert_eq!(model.err_bias, 4.5);
    assert_eq!(model.err_rand, 0.0);
    assert_eq!((model.min_long, model.min_lat), (-180.0, -90.0));
    assert_eq!((model.max_long, model.max_lat), (180.0, 90.0));
    assert_eq!(model.samp_num_coeff[1], 1.0);
    assert_eq!(model.line_num_coeff[2], -1.0);
    Ok(())
}

#[test]
fn test_metadata_round_trip() -> Result<()> {
    let model = linear_model();
    assert_eq!(RpcModel::extract(&model.to_metadata()?)?, model);
    Ok(())
}

#[test]
fn test_model_from_dataset_metadata() -> Result<()> {
    let mut ds = MemDataset::new((1000, 1000), 1, GdalDataType::UInt16);
    for (key, value) in linear_rpc_metadata().iter() {
        ds.set_metadata_item(key, value, "RPC")?;
    }
    assert_eq!(RpcModel::from_metadata(&ds)?, linear_model());

    let bare = MemDataset::new((1, 1), 1, GdalDataType::UInt8);
    assert!(matches!(
        RpcModel::from_metadata(&bare),
        Err(GdalError::InvalidModel { key: Some(_), .. })
    ));
    Ok(())
}

/// Metadata as a GDAL driver may report it, stray items included.
struct RawRpcDomain(Vec<String>);

impl Metadata for RawRpcDomain {
    fn description(&self) -> Result<String> {
        Ok(String::new())
    }

    fn metadata_domains(&self) -> Vec<String> {
        vec!["RPC".to_string()]
    }

    fn metadata_domain(&self, domain: &str) -> Option<Vec<String>> {
        (domain == "RPC").then(|| self.0.clone())
    }

    fn set_metadata_item(&mut self, key: &str, value: &str, _domain: &str) -> Result<()> {
        self.0.push(format!("{key}={value}"));
        Ok(())
    }
}

#[test]
fn test_model_ignores_stray_metadata_items() -> Result<()> {
    let mut items = linear_rpc_metadata().to_strings();
    items.push("SPECIAL-KEY (x)=1".to_string());
    items.push("no separator".to_string());
    items.insert(0, "=orphan value".to_string());
    assert_eq!(RpcModel::from_metadata(&RawRpcDomain(items))?, linear_model());
    Ok(())
}

#[test]
fn test_wrong_coefficient_count() -> Result<()> {
    let mut md = linear_rpc_metadata();
    md.set_name_value("LINE_DEN_COEFF", "1 0 0")?;
    assert!(matches!(
        RpcModel::extract(&md),
        Err(GdalError::InvalidModel {
            key: Some("LINE_DEN_COEFF"),
            ..
        })
    ));
    Ok(())
}

#[test]
fn test_degenerate_models_rejected() {
    let mut model = linear_model();
    model.lat_scale = 0.0;
    assert!(matches!(
        RpcTransformer::new(&model, false, 0.1, &CslStringList::new()),
        Err(GdalError::InvalidModel { .. })
    ));

    let mut model = linear_model();
    model.samp_den_coeff = [0.0; 20];
    assert!(matches!(
        RpcTransformer::new(&model, false, 0.1, &CslStringList::new()),
        Err(GdalError::InvalidModel { .. })
    ));
}

#[test]
fn test_native_options() {
    let model = linear_model();
    let dem = CslStringList::from(&[("RPC_DEM", "/data/dem.tif")]);
    assert!(matches!(
        RpcTransformer::new(&model, false, 0.1, &dem),
        Err(GdalError::BadArgument(_))
    ));

    let bad = CslStringList::from(&[("RPC_MAX_ITERATIONS", "many")]);
    assert!(RpcTransformer::new(&model, false, 0.1, &bad).is_err());
}

#[test]
fn test_forward_linear_model() -> Result<()> {
    init_tracing();
    let mut t = RpcTransformer::new(&linear_model(), false, 0.1, &CslStringList::new())?;
    let out = t.transform(&[10.05, 10.0], &[45.05, 45.0], &[0.0, 12.5], false)?;

    assert!(out.failures().is_empty());
    assert_eq!(out.success, vec![true, true]);
    assert_near!(out.x[0], 750.5, epsilon = 1e-9);
    assert_near!(out.y[0], 250.5, epsilon = 1e-9);
    assert_near!(out.x[1], 500.5, epsilon = 1e-9);
    assert_near!(out.y[1], 500.5, epsilon = 1e-9);
    assert_eq!(out.z, vec![0.0, 12.5]);
    Ok(())
}

#[test]
fn test_inverse_linear_model() -> Result<()> {
    let mut t = RpcTransformer::new(&linear_model(), false, 0.01, &CslStringList::new())?;
    let out = t.transform(&[750.5, 100.5], &[250.5, 900.5], &[0.0, 0.0], true)?;
    assert!(out.failures().is_empty());
    assert_near!(Point, out.point(0).unwrap(), (10.05, 45.05, 0.0), epsilon = 1e-6);
    assert_near!(Point, out.point(1).unwrap(), (9.92, 44.92, 0.0), epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_reversed_context_swaps_directions() -> Result<()> {
    let mut t = RpcTransformer::new(&linear_model(), true, 0.0, &CslStringList::new())?;
    assert!(t.is_reversed());

    let (lon, lat, _) = t.transform_point(750.5, 250.5, 0.0, false)?;
    assert_near!(lon, 10.05, epsilon = 1e-6);
    assert_near!(lat, 45.05, epsilon = 1e-6);

    let (pixel, line, _) = t.transform_point(lon, lat, 0.0, true)?;
    assert_near!(pixel, 750.5, epsilon = 0.1);
    assert_near!(line, 250.5, epsilon = 0.1);
    Ok(())
}

#[test]
fn test_height_options() -> Result<()> {
    // sample also depends on normalised height
    let mut md = linear_rpc_metadata();
    let mut samp_num = vec!["0"; 20];
    samp_num[1] = "1";
    samp_num[3] = "1";
    md.set_name_value("SAMP_NUM_COEFF", &samp_num.join(" "))?;
    let model = RpcModel::extract(&md)?;

    let options = CslStringList::from(&[("RPC_HEIGHT", "100"), ("RPC_HEIGHT_SCALE", "2")]);
    let mut t = RpcTransformer::new(&model, false, 0.1, &options)?;
    // h = 50 * 2 + 100 = 200, H = 200 / 1000
    let (pixel, _, z) = t.transform_point(10.0, 45.0, 50.0, false)?;
    assert_near!(pixel, 0.2 * 500.0 + 500.5, epsilon = 1e-9);
    assert_eq!(z, 50.0);
    Ok(())
}

#[test]
fn test_partial_failures_are_aggregated() -> Result<()> {
    init_tracing();
    // sample denominator 1 - L vanishes at lon 10.1
    let mut model = linear_model();
    model.samp_den_coeff[1] = -1.0;
    let mut t = RpcTransformer::new(&model, false, 0.1, &CslStringList::new())?;

    let x = [10.0, 10.1, 10.05, 10.1, f64::NAN];
    let y = [45.0, 45.0, 45.05, 45.02, 45.0];
    let z = [0.0, 1.0, 2.0, 3.0, 4.0];
    let out = t.transform(&x, &y, &z, false)?;

    assert_eq!(out.len(), 5);
    assert_eq!(out.success, vec![true, false, true, false, false]);
    assert_eq!(out.failures().indices(), vec![1, 3, 4]);
    assert_eq!(out.failures().total(), 5);
    let second = out.failures().iter().nth(1).unwrap();
    assert_eq!(second.input, (10.1, 45.02, 3.0));
    assert_eq!(second.reason, FailureReason::OutOfDomain);
    // successful points are still transformed
    assert_near!(out.x[2], 0.5 / 0.5 * 500.0 + 500.5, epsilon = 1e-9);

    let err = out.check().unwrap_err();
    assert!(matches!(err, GdalError::PartialTransform(ref f) if f.len() == 3));
    assert!(err
        .to_string()
        .starts_with("rpc transform failed for 3 of 5 points: #1 (10.1, 45, 1) out of domain"));
    Ok(())
}

#[test]
fn test_solver_failures_keep_best_effort() -> Result<()> {
    let solver = ScriptedSolver::new(vec![
        (0, PointStatus::NoConvergence),
        (2, PointStatus::Failed),
    ]);
    let mut t = RpcTransformer::with_solver(
        &solver,
        &linear_model(),
        false,
        0.1,
        &CslStringList::new(),
    )?;
    let out = t.transform(&[1.0, 2.0, 3.0], &[0.0; 3], &[0.0; 3], false)?;

    assert_eq!(out.x, vec![2.0, 3.0, 4.0]);
    let reasons: Vec<_> = out.failures().iter().map(|f| f.reason).collect();
    assert_eq!(
        reasons,
        vec![FailureReason::NoConvergence, FailureReason::Failed]
    );
    assert_eq!(out.failures().iter().next().unwrap().input, (1.0, 0.0, 0.0));
    Ok(())
}

#[test]
fn test_unequal_lengths_skip_solver() -> Result<()> {
    let solver = ScriptedSolver::new(Vec::new());
    let mut t = RpcTransformer::with_solver(
        &solver,
        &linear_model(),
        false,
        0.1,
        &CslStringList::new(),
    )?;

    let err = t.transform(&[1.0, 2.0], &[1.0], &[1.0, 2.0], false).unwrap_err();
    assert!(matches!(err, GdalError::BadArgument(_)));
    assert_eq!(solver.calls.load(Ordering::SeqCst), 0);

    let out = t.transform(&[], &[], &[], false)?;
    assert!(out.is_empty());
    assert_eq!(solver.calls.load(Ordering::SeqCst), 0);

    t.transform(&[1.0], &[1.0], &[1.0], false)?;
    assert_eq!(solver.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_release_is_idempotent() -> Result<()> {
    init_tracing();
    let mut t = RpcTransformer::new(&linear_model(), false, 0.1, &CslStringList::new())?;
    assert!(!t.is_released());
    t.release();
    t.release();
    assert!(t.is_released());

    let err = t.transform(&[10.0], &[45.0], &[0.0], false).unwrap_err();
    assert!(matches!(err, GdalError::ContextReleased));
    Ok(())
}

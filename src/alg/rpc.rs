//! Rational polynomial coefficient (RPC00B) camera models.

use tracing::debug;

use crate::cpl::CslStringList;
use crate::errors::{GdalError, Result};
use crate::metadata::Metadata;

/// Metadata domain RPC coefficients are stored in.
pub const RPC_DOMAIN: &str = "RPC";

pub const RPC_LINE_NUM_COEFF: &str = "LINE_NUM_COEFF";
pub const RPC_LINE_DEN_COEFF: &str = "LINE_DEN_COEFF";
pub const RPC_SAMP_NUM_COEFF: &str = "SAMP_NUM_COEFF";
pub const RPC_SAMP_DEN_COEFF: &str = "SAMP_DEN_COEFF";

/// Keys a model cannot be built without, in the order they are checked.
pub const RPC_REQUIRED_KEYS: [&str; 4] = [
    RPC_LINE_NUM_COEFF,
    RPC_LINE_DEN_COEFF,
    RPC_SAMP_NUM_COEFF,
    RPC_SAMP_DEN_COEFF,
];

/// Number of coefficients in each RPC00B polynomial.
pub const RPC_COEFF_COUNT: usize = 20;

/// An immutable RPC00B model: four 20-term polynomials plus the offsets and
/// scales that normalise ground and image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcModel {
    pub line_off: f64,
    pub samp_off: f64,
    pub lat_off: f64,
    pub long_off: f64,
    pub height_off: f64,

    pub line_scale: f64,
    pub samp_scale: f64,
    pub lat_scale: f64,
    pub long_scale: f64,
    pub height_scale: f64,

    pub line_num_coeff: [f64; RPC_COEFF_COUNT],
    pub line_den_coeff: [f64; RPC_COEFF_COUNT],
    pub samp_num_coeff: [f64; RPC_COEFF_COUNT],
    pub samp_den_coeff: [f64; RPC_COEFF_COUNT],

    pub min_long: f64,
    pub min_lat: f64,
    pub max_long: f64,
    pub max_lat: f64,

    pub err_bias: f64,
    pub err_rand: f64,
}

/// Leading number of a metadata value; values like `"4.5 pixels"` carry a unit word.
fn leading_number(value: &str) -> Option<f64> {
    value.split_whitespace().next()?.parse().ok()
}

fn scalar(md: &CslStringList, key: &'static str, default: f64) -> Result<f64> {
    match md.fetch_name_value(key) {
        None => Ok(default),
        Some(value) => leading_number(value).ok_or_else(|| GdalError::InvalidModel {
            key: Some(key),
            msg: format!("{key} is not a number: '{value}'"),
        }),
    }
}

fn coefficients(md: &CslStringList, key: &'static str) -> Result<[f64; RPC_COEFF_COUNT]> {
    let value = md
        .fetch_name_value(key)
        .ok_or_else(|| GdalError::missing_key(key))?;
    let parsed = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| GdalError::InvalidModel {
            key: Some(key),
            msg: format!("{key} holds a value that is not a number: {e}"),
        })?;
    <[f64; RPC_COEFF_COUNT]>::try_from(parsed.as_slice()).map_err(|_| GdalError::InvalidModel {
        key: Some(key),
        msg: format!(
            "{key} has {} coefficients, expected {RPC_COEFF_COUNT}",
            parsed.len()
        ),
    })
}

impl RpcModel {
    /// Builds a model from flat RPC metadata (`KEY=VALUE` items of the `RPC` domain).
    ///
    /// The four coefficient lists are required; a missing one fails with
    /// [`GdalError::InvalidModel`] naming the key. Offsets default to 0,
    /// scales to 1 and the validity box to the whole globe.
    pub fn extract(md: &CslStringList) -> Result<Self> {
        for key in RPC_REQUIRED_KEYS {
            if md.fetch_name_value(key).is_none() {
                return Err(GdalError::missing_key(key));
            }
        }

        Ok(RpcModel {
            line_off: scalar(md, "LINE_OFF", 0.0)?,
            samp_off: scalar(md, "SAMP_OFF", 0.0)?,
            lat_off: scalar(md, "LAT_OFF", 0.0)?,
            long_off: scalar(md, "LONG_OFF", 0.0)?,
            height_off: scalar(md, "HEIGHT_OFF", 0.0)?,
            line_scale: scalar(md, "LINE_SCALE", 1.0)?,
            samp_scale: scalar(md, "SAMP_SCALE", 1.0)?,
            lat_scale: scalar(md, "LAT_SCALE", 1.0)?,
            long_scale: scalar(md, "LONG_SCALE", 1.0)?,
            height_scale: scalar(md, "HEIGHT_SCALE", 1.0)?,
            line_num_coeff: coefficients(md, RPC_LINE_NUM_COEFF)?,
            line_den_coeff: coefficients(md, RPC_LINE_DEN_COEFF)?,
            samp_num_coeff: coefficients(md, RPC_SAMP_NUM_COEFF)?,
            samp_den_coeff: coefficients(md, RPC_SAMP_DEN_COEFF)?,
            min_long: scalar(md, "MIN_LONG", -180.0)?,
            min_lat: scalar(md, "MIN_LAT", -90.0)?,
            max_long: scalar(md, "MAX_LONG", 180.0)?,
            max_lat: scalar(md, "MAX_LAT", 90.0)?,
            err_bias: scalar(md, "ERR_BIAS", 0.0)?,
            err_rand: scalar(md, "ERR_RAND", 0.0)?,
        })
    }

    /// Reads the model from the `RPC` metadata domain of `source`.
    ///
    /// Items that are not `KEY=VALUE` with a plain key are skipped.
    pub fn from_metadata<M: Metadata + ?Sized>(source: &M) -> Result<Self> {
        let mut md = CslStringList::new();
        for item in source.metadata_domain(RPC_DOMAIN).unwrap_or_default() {
            if let Err(e) = md.add_string(&item) {
                debug!(item, error = %e, "skipping unparseable RPC metadata item");
            }
        }
        Self::extract(&md)
    }

    /// Rejects models no solver can evaluate: a zero scale or an all-zero denominator.
    pub fn validate(&self) -> Result<()> {
        for (name, scale) in [
            ("LINE_SCALE", self.line_scale),
            ("SAMP_SCALE", self.samp_scale),
            ("LAT_SCALE", self.lat_scale),
            ("LONG_SCALE", self.long_scale),
            ("HEIGHT_SCALE", self.height_scale),
        ] {
            if scale == 0.0 || !scale.is_finite() {
                return Err(GdalError::invalid_model(format!(
                    "{name} must be finite and non-zero, got {scale}"
                )));
            }
        }
        for (name, den) in [
            (RPC_LINE_DEN_COEFF, &self.line_den_coeff),
            (RPC_SAMP_DEN_COEFF, &self.samp_den_coeff),
        ] {
            if den.iter().all(|&c| c == 0.0) {
                return Err(GdalError::invalid_model(format!(
                    "{name} is identically zero"
                )));
            }
        }
        Ok(())
    }

    /// The model as `RPC` domain metadata items.
    pub fn to_metadata(&self) -> Result<CslStringList> {
        fn join(coeffs: &[f64]) -> String {
            coeffs
                .iter()
                .map(|c| format!("{c:e}"))
                .collect::<Vec<_>>()
                .join(" ")
        }

        let mut md = CslStringList::new();
        for (key, value) in [
            ("LINE_OFF", self.line_off),
            ("SAMP_OFF", self.samp_off),
            ("LAT_OFF", self.lat_off),
            ("LONG_OFF", self.long_off),
            ("HEIGHT_OFF", self.height_off),
            ("LINE_SCALE", self.line_scale),
            ("SAMP_SCALE", self.samp_scale),
            ("LAT_SCALE", self.lat_scale),
            ("LONG_SCALE", self.long_scale),
            ("HEIGHT_SCALE", self.height_scale),
            ("MIN_LONG", self.min_long),
            ("MIN_LAT", self.min_lat),
            ("MAX_LONG", self.max_long),
            ("MAX_LAT", self.max_lat),
            ("ERR_BIAS", self.err_bias),
            ("ERR_RAND", self.err_rand),
        ] {
            md.set_name_value(key, &value.to_string())?;
        }
        md.set_name_value(RPC_LINE_NUM_COEFF, &join(&self.line_num_coeff))?;
        md.set_name_value(RPC_LINE_DEN_COEFF, &join(&self.line_den_coeff))?;
        md.set_name_value(RPC_SAMP_NUM_COEFF, &join(&self.samp_num_coeff))?;
        md.set_name_value(RPC_SAMP_DEN_COEFF, &join(&self.samp_den_coeff))?;
        Ok(md)
    }
}

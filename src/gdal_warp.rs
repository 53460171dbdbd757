//! `gdalwarp` as the reprojection engine.

use crate::error::{DisaggError, Result};
use crate::warp::{WarpRequest, Warper};
use gdal::cpl::CslStringList;
use gdal::Dataset;
use log::debug;
use std::ffi::{c_int, CStr, CString};

struct WarpAppOptionsWrapper {
    options: *mut gdal_sys::GDALWarpAppOptions,
}

impl WarpAppOptionsWrapper {
    fn new(args: &[String]) -> Result<Self> {
        let mut c_opts = CslStringList::new();
        for arg in args {
            c_opts.add_string(arg)?;
        }

        let options =
            unsafe { gdal_sys::GDALWarpAppOptionsNew(c_opts.as_ptr(), core::ptr::null_mut()) };
        if options.is_null() {
            return Err(DisaggError::ResamplingFailed(format!(
                "invalid gdalwarp arguments: {}",
                args.join(" ")
            )));
        }
        Ok(WarpAppOptionsWrapper { options })
    }
}

impl Drop for WarpAppOptionsWrapper {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALWarpAppOptionsFree(self.options);
        }
    }
}

fn last_error_message() -> String {
    unsafe {
        let msg = gdal_sys::CPLGetLastErrorMsg();
        if msg.is_null() {
            return String::new();
        }
        CStr::from_ptr(msg).to_string_lossy().into_owned()
    }
}

/// Command line arguments equivalent to `request`, writing to an in-memory dataset.
pub fn warp_arguments(request: &WarpRequest) -> Vec<String> {
    let mut args = vec![
        "-of".to_string(),
        "MEM".to_string(),
        "-t_srs".to_string(),
        request.target_projection.clone(),
        "-r".to_string(),
        request.resampling.as_gdal_str().to_string(),
    ];
    if let Some((x, y)) = request.resolution {
        args.extend(["-tr".to_string(), x.to_string(), y.to_string()]);
    }
    if let Some(bounds) = request.bounds {
        args.push("-te".to_string());
        args.extend(bounds.as_array().iter().map(|v| v.to_string()));
    }
    args
}

/// Runs `GDALWarp` in process. Each call produces a new in-memory dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalWarper;

impl Warper for GdalWarper {
    type Raster = Dataset;

    fn warp(&self, source: &Dataset, request: &WarpRequest) -> Result<Dataset> {
        let args = warp_arguments(request);
        debug!("gdalwarp {}", args.join(" "));
        let options = WarpAppOptionsWrapper::new(&args)?;
        let dest = CString::new("")?;

        let warped = unsafe {
            let mut user_error: c_int = 0;
            let handle = gdal_sys::GDALWarp(
                dest.as_ptr(),
                std::ptr::null_mut(),
                1,
                &mut source.c_dataset(),
                options.options,
                &mut user_error,
            );
            if user_error != 0 {
                return Err(DisaggError::ResamplingFailed(
                    "GDAL Warp: invalid arguments".to_string(),
                ));
            }
            if handle.is_null() {
                return Err(DisaggError::ResamplingFailed(last_error_message()));
            }
            Dataset::from_c_dataset(handle)
        };

        Ok(warped)
    }
}

//! Naming the variables of netCDF files written by GDAL.
//!
//! GDAL's netCDF driver calls its variables `Band1`, `Band2`, ... and only
//! attaches the `grid_mapping` attribute reliably to the first one.

use crate::error::{DisaggError, Result};
use log::debug;
use std::ffi::{c_char, c_int, CStr, CString};

const GRID_MAPPING: &str = "grid_mapping";

fn check(code: c_int) -> Result<()> {
    if code == netcdf_sys::NC_NOERR {
        return Ok(());
    }
    let message = unsafe { CStr::from_ptr(netcdf_sys::nc_strerror(code)) };
    Err(DisaggError::NetCdf(message.to_string_lossy().into_owned()))
}

/// A netCDF file opened for writing, closed on drop.
struct NcFile {
    ncid: c_int,
}

impl NcFile {
    fn open_for_update(path: &str) -> Result<Self> {
        let c_path = CString::new(path)?;
        let mut ncid: c_int = 0;
        check(unsafe { netcdf_sys::nc_open(c_path.as_ptr(), netcdf_sys::NC_WRITE, &mut ncid) })?;
        Ok(Self { ncid })
    }

    fn varid(&self, name: &str) -> Result<c_int> {
        let c_name = CString::new(name)?;
        let mut varid: c_int = 0;
        check(unsafe { netcdf_sys::nc_inq_varid(self.ncid, c_name.as_ptr(), &mut varid) })?;
        Ok(varid)
    }

    fn text_attribute(&self, varid: c_int, name: &str) -> Result<Option<String>> {
        let c_name = CString::new(name)?;
        let mut len: usize = 0;
        let code =
            unsafe { netcdf_sys::nc_inq_attlen(self.ncid, varid, c_name.as_ptr(), &mut len) };
        if code == netcdf_sys::NC_ENOTATT {
            return Ok(None);
        }
        check(code)?;

        let mut buffer = vec![0u8; len];
        check(unsafe {
            netcdf_sys::nc_get_att_text(
                self.ncid,
                varid,
                c_name.as_ptr(),
                buffer.as_mut_ptr() as *mut c_char,
            )
        })?;
        let text = String::from_utf8_lossy(&buffer);
        Ok(Some(text.trim_end_matches('\0').to_string()))
    }

    fn put_text_attribute(&self, varid: c_int, name: &str, value: &str) -> Result<()> {
        let c_name = CString::new(name)?;
        check(unsafe {
            netcdf_sys::nc_put_att_text(
                self.ncid,
                varid,
                c_name.as_ptr(),
                value.len(),
                value.as_ptr() as *const c_char,
            )
        })
    }

    fn rename_variable(&self, varid: c_int, name: &str) -> Result<()> {
        let c_name = CString::new(name)?;
        check(unsafe { netcdf_sys::nc_rename_var(self.ncid, varid, c_name.as_ptr()) })
    }
}

impl Drop for NcFile {
    fn drop(&mut self) {
        unsafe {
            netcdf_sys::nc_close(self.ncid);
        }
    }
}

/// Rename `Band<i>` to `field_names[i - 1]` and give every renamed variable
/// the grid mapping of the first band.
pub fn rename_band_variables(path: &str, field_names: &[String]) -> Result<()> {
    let file = NcFile::open_for_update(path)?;
    let grid_mapping = file.text_attribute(file.varid("Band1")?, GRID_MAPPING)?;

    check(unsafe { netcdf_sys::nc_redef(file.ncid) })?;
    for (i, name) in field_names.iter().enumerate() {
        let band_name = format!("Band{}", i + 1);
        let varid = file.varid(&band_name)?;
        debug!("Renaming netCDF variable {} to {}", band_name, name);
        file.rename_variable(varid, name)?;
        if let Some(mapping) = &grid_mapping {
            file.put_text_attribute(varid, GRID_MAPPING, mapping)?;
        }
    }
    check(unsafe { netcdf_sys::nc_enddef(file.ncid) })
}

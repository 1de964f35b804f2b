//! pixscatter-io - Raster load/save
//!
//! Reads and writes Windows bitmap files. This is the only crate in the
//! workspace that touches the filesystem; the distributed pipeline calls it
//! on rank 0 alone.

pub mod bmp;
mod error;

pub use bmp::{read_bmp, write_bmp};
pub use error::{IoError, IoResult};

use pixscatter_core::Raster;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Load a bitmap file into a raster.
///
/// # Errors
///
/// Returns [`IoError::File`] if the file cannot be opened and
/// [`IoError::InvalidData`] / [`IoError::UnsupportedFormat`] if it is not a
/// readable bitmap.
pub fn read_raster<P: AsRef<Path>>(path: P) -> IoResult<Raster> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let raster = read_bmp(BufReader::new(file))?;
    log::debug!(
        "loaded {} ({}x{})",
        path.display(),
        raster.width(),
        raster.height()
    );
    Ok(raster)
}

/// Save a raster as a 24-bit bitmap file.
pub fn write_raster<P: AsRef<Path>>(path: P, raster: &Raster) -> IoResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| IoError::File {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_bmp(raster, &mut writer)?;
    writer.flush()?;
    log::debug!(
        "saved {} ({}x{})",
        path.display(),
        raster.width(),
        raster.height()
    );
    Ok(())
}

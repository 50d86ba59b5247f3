use std::path::Path;

use crate::error::{MetaError, Result};

pub fn check_range_f64(value: f64, min: f64, max: f64, name: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(MetaError::InvalidArgument(format!(
            "Value of {name} should be finite"
        )));
    }
    if value < min {
        return Err(MetaError::InvalidArgument(format!(
            "Value of {name} should be above {min}"
        )));
    }
    if value > max {
        return Err(MetaError::InvalidArgument(format!(
            "Value of {name} should be below {max}"
        )));
    }
    Ok(())
}

pub fn check_dir_exists(path: &Path, name: &str) -> Result<()> {
    if !path.is_dir() {
        return Err(MetaError::InvalidArgument(format!(
            "Directory {path:?} passed to {name} does not exist"
        )));
    }
    Ok(())
}

pub fn check_file_exists(path: &Path, name: &str) -> Result<()> {
    if !path.is_file() {
        return Err(MetaError::InvalidArgument(format!(
            "File {path:?} passed to {name} does not exist"
        )));
    }
    Ok(())
}

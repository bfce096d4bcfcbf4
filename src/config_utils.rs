use std::path::Path;
use std::path::PathBuf;

use yaml_rust::Yaml;

use super::error::{DispatchError, DispatchResult};


pub fn str_to_absolute_path(path_str: &str, default_base_dir: &Path) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        return path;
    } else {
        return [default_base_dir, Path::new(&path)].iter().collect();
    }
}

fn wrong_type(key: &str, expected: &str, value: &Yaml) -> DispatchError {
    DispatchError::Config(format!("'{}' should be {}, got {:?}", key, expected, value))
}

/// Reads a number, accepting integers as well as reals.  Missing keys give `default`.
pub fn get_f64_or(yaml_cfg: &Yaml, key: &str, default: f64) -> DispatchResult<f64> {
    match &yaml_cfg[key] {
        Yaml::BadValue | Yaml::Null => Ok(default),
        Yaml::Integer(ii) => Ok(*ii as f64),
        value @ Yaml::Real(_) => value.as_f64().ok_or_else(|| wrong_type(key, "a number", value)),
        value => Err(wrong_type(key, "a number", value)),
    }
}

pub fn get_usize_or(yaml_cfg: &Yaml, key: &str, default: usize) -> DispatchResult<usize> {
    match &yaml_cfg[key] {
        Yaml::BadValue | Yaml::Null => Ok(default),
        Yaml::Integer(ii) if *ii >= 0 => Ok(*ii as usize),
        value => Err(wrong_type(key, "a non-negative integer", value)),
    }
}

pub fn get_u64_or(yaml_cfg: &Yaml, key: &str, default: u64) -> DispatchResult<u64> {
    get_usize_or(yaml_cfg, key, default as usize).map(|vv| vv as u64)
}

pub fn get_opt_str<'a>(yaml_cfg: &'a Yaml, key: &str) -> DispatchResult<Option<&'a str>> {
    match &yaml_cfg[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::String(ss) => Ok(Some(ss.as_str())),
        value => Err(wrong_type(key, "a string", value)),
    }
}

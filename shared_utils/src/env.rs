use std::str::FromStr;

use thiserror::Error;

/// An environment variable is set but its value cannot be parsed.
#[derive(Debug, Error)]
#[error("Invalid value {value:?} for environment variable {name}: {message}")]
pub struct InvalidEnvVarError {
    pub name: String,
    pub value: String,
    pub message: String,
}

/// Reads an optional environment variable.
///
/// Unset, non-unicode and blank values are all reported as `None`, so callers
/// can treat `FOO=` the same as an absent `FOO`.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Reads and parses an optional environment variable.
///
/// Returns `Ok(None)` when the variable is unset or blank and an
/// [`InvalidEnvVarError`] when it is set to something `T` cannot parse.
pub fn parse_env_var<T>(name: &str) -> Result<Option<T>, InvalidEnvVarError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_var_opt(name) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|e| InvalidEnvVarError {
            name: name.to_string(),
            message: e.to_string(),
            value: raw,
        }),
    }
}

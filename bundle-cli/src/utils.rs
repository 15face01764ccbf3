use reqwest::header::{HeaderName, HeaderValue};

use crate::error::HeaderError;

/// Parse a `-H "Name: Value"` argument. Only the first colon separates, so
/// values such as URLs keep theirs.
pub fn parse_header(arg: &str) -> Result<(HeaderName, HeaderValue), HeaderError> {
    let (name, value) = arg
        .split_once(':')
        .ok_or_else(|| HeaderError::MissingSeparator(arg.to_owned()))?;

    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|_| HeaderError::InvalidName(name.trim().to_owned()))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|_| HeaderError::InvalidValue(name.to_string()))?;

    Ok((name, value))
}

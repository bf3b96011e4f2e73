use crate::errors::ServerError;

/// Parses the `enable` query parameter. `1`, `0`, `true` and `false` are accepted, ignoring case and surrounding
/// whitespace.
pub fn parse_enable_flag(value: Option<&str>) -> Result<bool, ServerError> {
    let value = value.ok_or_else(|| ServerError::InvalidEnableFlag("enable is required".into()))?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ServerError::InvalidEnableFlag("expected one of 1, 0, true, false".into())),
    }
}

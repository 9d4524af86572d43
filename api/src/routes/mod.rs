//! API Routes

pub mod campaigns;
pub mod engagements;
pub mod health;
pub mod users;

use crate::error::ApiError;

/// Parse an optional numeric query parameter
pub(crate) fn parse_number(name: &str, raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ApiError::invalid_parameter(format!("{name} must be a number, got {value:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("lat", None).unwrap(), None);
        assert_eq!(parse_number("lat", Some("")).unwrap(), None);
        assert_eq!(parse_number("lat", Some(" 40.5 ")).unwrap(), Some(40.5));
        assert!(parse_number("lat", Some("north")).is_err());
    }
}

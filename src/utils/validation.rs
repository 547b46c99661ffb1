use crate::utils::error::{Result, UnifyError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub const HTTP_SCHEMES: &[&str] = &["http", "https"];

pub fn validate_url(field_name: &str, url_str: &str, allowed_schemes: &[&str]) -> Result<Url> {
    if url_str.is_empty() {
        return Err(UnifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => {
            if allowed_schemes.contains(&url.scheme()) {
                Ok(url)
            } else {
                Err(UnifyError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: url_str.to_string(),
                    reason: format!(
                        "Unsupported URL scheme: {}. Allowed schemes: {}",
                        url.scheme(),
                        allowed_schemes.join(", ")
                    ),
                })
            }
        }
        Err(e) => Err(UnifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| UnifyError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(UnifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(UnifyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 取得必填的連線字串，並拒絕空白值
pub fn required_connection_string<'a>(
    field_name: &str,
    value: &'a Option<String>,
) -> Result<&'a str> {
    let value = validate_required_field(field_name, value)?;
    validate_non_empty_string(field_name, value)?;
    Ok(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("endpoint", "https://example.com", HTTP_SCHEMES).is_ok());
        assert!(validate_url("endpoint", "http://example.com", HTTP_SCHEMES).is_ok());
        assert!(validate_url("endpoint", "", HTTP_SCHEMES).is_err());
        assert!(validate_url("endpoint", "invalid-url", HTTP_SCHEMES).is_err());
        assert!(validate_url("endpoint", "ftp://example.com", HTTP_SCHEMES).is_err());
        assert!(validate_url("db", "sqlite://data.db", &["sqlite", "postgres"]).is_ok());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("port", 3000u16, 1, u16::MAX).is_ok());
        assert!(validate_range("port", 0u16, 1, u16::MAX).is_err());
    }

    #[test]
    fn test_required_connection_string() {
        let missing: Option<String> = None;
        match required_connection_string("SQL_CONNECTION_STRING", &missing) {
            Err(UnifyError::MissingConfigError { field }) => {
                assert_eq!(field, "SQL_CONNECTION_STRING")
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let blank = Some("   ".to_string());
        assert!(required_connection_string("SQL_CONNECTION_STRING", &blank).is_err());

        let present = Some(" sqlite::memory: ".to_string());
        assert_eq!(
            required_connection_string("SQL_CONNECTION_STRING", &present).unwrap(),
            "sqlite::memory:"
        );
    }
}

use crate::error::ApiError;

pub fn validate_days(value: u8) -> Result<u8, ApiError> {
    if (1..=31).contains(&value) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest("days must be between 1 and 31".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_days() {
        assert!(validate_days(1).is_ok());
        assert!(validate_days(31).is_ok());
        assert!(validate_days(0).is_err());
        assert!(validate_days(32).is_err());
    }
}

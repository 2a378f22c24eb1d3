use validator::ValidationError;

/// 经销商ID只允许字母、数字、下划线和连字符
pub fn validate_dealer_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::new("经销商ID不能为空"));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::new(
            "经销商ID只能包含字母、数字、下划线和连字符",
        ));
    }

    Ok(())
}

/// 查询条数限制
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(20).clamp(1, 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dealer_id() {
        assert!(validate_dealer_id("dealer-01").is_ok());
        assert!(validate_dealer_id("dealer_01").is_ok());
        assert!(validate_dealer_id("").is_err());
        assert!(validate_dealer_id("dealer 01").is_err());
        assert!(validate_dealer_id("dealer/01").is_err());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), 100);
    }
}

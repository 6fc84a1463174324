//! Test helpers for the Contentful API

pub fn create_test_client(url: &str) -> super::Client {
    super::Client::with_config(
        url,
        "test-cma-token",
        None,
        super::RetryConfig {
            max_retries: 0,
            ..Default::default()
        },
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_api_error_formatting() {
        let error = ApiError::ApiError {
            status: 422,
            id: "ValidationFailed".to_string(),
            message: "Validation error".to_string(),
            request_id: Some("req-9".to_string()),
        };

        let error_str = error.to_string();
        assert!(error_str.contains("HTTP 422"));
        assert!(error_str.contains("ValidationFailed"));
        assert!(error_str.contains("Validation error"));
    }

    #[test]
    fn test_not_found_detection() {
        let not_found = ApiError::NotFound {
            message: "gone".to_string(),
            request_id: None,
        };
        assert!(not_found.is_not_found());
        assert!(!ApiError::RateLimited.is_not_found());
    }
}

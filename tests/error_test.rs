use std::time::Duration;

use huginn::HuginnError;

#[test]
fn transient_classification() {
    assert!(HuginnError::Http("connection reset".into()).is_transient());
    assert!(HuginnError::RateLimited { retry_after: None }.is_transient());
    assert!(
        HuginnError::Api {
            status: 500,
            message: "internal".into()
        }
        .is_transient()
    );
    assert!(
        HuginnError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient()
    );
}

#[test]
fn permanent_classification() {
    assert!(!HuginnError::AuthenticationFailed.is_transient());
    assert!(!HuginnError::ModelNotFound("m".into()).is_transient());
    assert!(!HuginnError::InvalidInput("empty".into()).is_transient());
    assert!(!HuginnError::NoProvider.is_transient());
    assert!(!HuginnError::EmptyResponse.is_transient());
    assert!(!HuginnError::Configuration("bad".into()).is_transient());
    assert!(
        !HuginnError::Api {
            status: 422,
            message: "unprocessable".into()
        }
        .is_transient()
    );
}

#[test]
fn retry_after_only_from_rate_limit() {
    let hinted = HuginnError::RateLimited {
        retry_after: Some(Duration::from_secs(4)),
    };
    assert_eq!(hinted.retry_after(), Some(Duration::from_secs(4)));
    assert_eq!(HuginnError::Http("x".into()).retry_after(), None);
}

#[test]
fn json_errors_convert() {
    let err: HuginnError = serde_json::from_str::<serde_json::Value>("{not json")
        .unwrap_err()
        .into();
    assert!(matches!(err, HuginnError::Json(_)));
    assert!(err.to_string().starts_with("JSON error"));
}

#[test]
fn display_messages() {
    assert_eq!(
        HuginnError::Api {
            status: 400,
            message: "bad".into()
        }
        .to_string(),
        "API error (400): bad"
    );
    assert_eq!(
        HuginnError::ModelNotFound("llama".into()).to_string(),
        "model not found: llama"
    );
}

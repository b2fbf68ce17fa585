use federation_scanner::error::{FetchError, SourceError, StoreError};
use hyper::StatusCode;
use std::time::Duration;

#[test]
fn test_only_tls_errors_warrant_retry() {
    assert!(FetchError::Tls("UnknownIssuer".into()).is_tls());
    assert!(!FetchError::Network("connection refused".into()).is_tls());
    assert!(!FetchError::Timeout(Duration::from_secs(3)).is_tls());
    assert!(
        !FetchError::Http {
            status: StatusCode::NOT_FOUND,
            context: "version".into()
        }
        .is_tls()
    );
    assert!(!FetchError::Json("eof".into()).is_tls());
    assert!(!FetchError::InvalidDomain("bad name".into()).is_tls());
    assert!(!FetchError::TooManyRedirects(10).is_tls());
}

#[test]
fn test_fetch_error_messages() {
    assert_eq!(
        FetchError::Http {
            status: StatusCode::BAD_GATEWAY,
            context: "version endpoint of example.org:8448".into()
        }
        .to_string(),
        "HTTP status 502 Bad Gateway: version endpoint of example.org:8448"
    );
    assert_eq!(
        FetchError::TooManyRedirects(10).to_string(),
        "Redirect loop or too many redirects (limit 10)"
    );
}

#[test]
fn test_source_error_keeps_io_cause() {
    let err = SourceError::Io {
        path: "data/hostnames.txt".into(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    assert!(err.to_string().contains("data/hostnames.txt"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_store_error_from_db_err() {
    let err: StoreError = sea_orm::DbErr::Custom("boom".into()).into();
    assert!(matches!(err, StoreError::Database(_)));
    assert_eq!(
        StoreError::InvalidRow("bad".into()).to_string(),
        "Invalid stored row: bad"
    );
}

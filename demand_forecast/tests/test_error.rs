use demand_forecast::ForecastError;
use demand_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    assert!(matches!(ForecastError::from(io_error), ForecastError::Io(_)));

    let math_error = MathError::InsufficientData("no observations".to_string());
    assert!(matches!(ForecastError::from(math_error), ForecastError::Math(_)));

    let json_error = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
    assert!(matches!(ForecastError::from(json_error), ForecastError::Json(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InsufficientData { train: 49, test: 10 };
    assert_eq!(error.to_string(), "Insufficient data: train=49, test=10");

    let error = ForecastError::Schema("Duplicate feature column 'month'".to_string());
    assert!(error.to_string().starts_with("Schema error"));
    assert!(error.to_string().contains("month"));

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = ForecastError::from(io_error).to_string();
    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_config_errors_are_invalid_parameter() {
    let config = demand_forecast::ForecastConfig {
        train_year: 2023,
        test_year: 2023,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ForecastError::InvalidParameter(_))
    ));

    let config = demand_forecast::ForecastConfig {
        windows: vec![7, 0],
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ForecastError::InvalidParameter(_))
    ));
}

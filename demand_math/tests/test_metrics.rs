use approx::assert_relative_eq;
use demand_math::{mean_absolute_percentage_error, root_mean_squared_error, MathError};
use rstest::rstest;

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    // (20% + 10% + 10% + 7.5% + 4%) / 5
    let mape = mean_absolute_percentage_error(&actual, &predicted).unwrap();
    assert_relative_eq!(mape, 10.3, epsilon = 1e-9);

    let rmse = root_mean_squared_error(&actual, &predicted).unwrap();
    assert_relative_eq!(rmse, 10.0_f64.sqrt(), epsilon = 1e-9);
}

#[test]
fn test_perfect_forecast_scores_zero() {
    let actual = vec![3.0, 4.0, 5.0];
    assert_relative_eq!(mean_absolute_percentage_error(&actual, &actual).unwrap(), 0.0);
    assert_relative_eq!(root_mean_squared_error(&actual, &actual).unwrap(), 0.0);
}

#[test]
fn test_zero_actual_is_guarded() {
    let mape = mean_absolute_percentage_error(&[0.0], &[1.0]).unwrap();
    assert!(mape.is_finite());
    assert!(mape > 1e10);
}

#[rstest]
#[case(vec![], vec![])]
#[case(vec![1.0, 2.0], vec![1.0])]
fn test_invalid_inputs_are_rejected(#[case] actual: Vec<f64>, #[case] predicted: Vec<f64>) {
    assert!(mean_absolute_percentage_error(&actual, &predicted).is_err());

    let err = root_mean_squared_error(&actual, &predicted).unwrap_err();
    assert!(matches!(
        err,
        MathError::InsufficientData(_) | MathError::InvalidInput(_)
    ));
}

#[test]
fn test_non_finite_result_is_calculation_error() {
    let err = root_mean_squared_error(&[1.0, f64::NAN], &[1.0, 2.0]).unwrap_err();
    assert!(matches!(err, MathError::CalculationError(_)));
}

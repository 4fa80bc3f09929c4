//! Gap filling for sparse feature columns

/// Replace each missing value with the closest earlier present value.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
}

/// Replace each missing value with the closest later present value.
pub fn backward_fill(values: &mut [Option<f64>]) {
    let mut next = None;
    for value in values.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }
}

/// Forward fill, then backward fill, then zero whatever is still missing.
pub fn fill_missing(mut values: Vec<Option<f64>>) -> Vec<f64> {
    forward_fill(&mut values);
    backward_fill(&mut values);
    values.into_iter().map(|v| v.unwrap_or(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_fill_leaves_leading_gaps() {
        let mut values = vec![None, Some(1.0), None, Some(3.0), None];
        forward_fill(&mut values);
        assert_eq!(values, vec![None, Some(1.0), Some(1.0), Some(3.0), Some(3.0)]);
    }

    #[test]
    fn test_fill_missing_priority() {
        let filled = fill_missing(vec![None, None, Some(4.0), None]);
        assert_eq!(filled, vec![4.0, 4.0, 4.0, 4.0]);

        let filled = fill_missing(vec![None, None]);
        assert_eq!(filled, vec![0.0, 0.0]);
    }
}

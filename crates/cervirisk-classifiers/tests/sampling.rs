use cervirisk_classifiers::sampling::{class_balance, Smote};
use cervirisk_classifiers::error::ModelError;
use ndarray::Array2;

fn imbalanced(n_major: usize, n_minor: usize) -> (Array2<f64>, Vec<usize>) {
    let n = n_major + n_minor;
    let x = Array2::from_shape_fn((n, 2), |(r, c)| {
        if r < n_major {
            (r + c) as f64
        } else {
            100.0 + (r - n_major) as f64 * (c + 1) as f64
        }
    });
    let y = (0..n).map(|r| usize::from(r >= n_major)).collect();
    (x, y)
}

#[test]
fn smote_reaches_requested_ratio() {
    let (x, y) = imbalanced(100, 5);
    let smote = Smote::new(0.3, 42);
    let (xr, yr) = smote.fit_resample(&x, &y).unwrap();

    assert_eq!(class_balance(&yr), [100, 30]);
    assert_eq!(xr.nrows(), yr.len());
    // originals are kept in place
    assert_eq!(xr.row(0), x.row(0));
    assert_eq!(xr.row(104), x.row(104));
}

#[test]
fn synthetic_rows_stay_inside_the_minority_hull() {
    let (x, y) = imbalanced(50, 6);
    let (xr, _) = Smote::new(1.0, 3).fit_resample(&x, &y).unwrap();
    for row in xr.rows().into_iter().skip(56) {
        assert!(row[0] >= 100.0 && row[0] <= 105.0);
        assert!(row[1] >= 100.0 && row[1] <= 110.0);
    }
}

#[test]
fn smote_is_seeded() {
    let (x, y) = imbalanced(40, 4);
    let a = Smote::new(0.5, 9).fit_resample(&x, &y).unwrap();
    let b = Smote::new(0.5, 9).fit_resample(&x, &y).unwrap();
    assert_eq!(a, b);
}

#[test]
fn balanced_enough_data_is_untouched() {
    let (x, y) = imbalanced(10, 5);
    let (xr, yr) = Smote::new(0.3, 42).fit_resample(&x, &y).unwrap();
    assert_eq!(xr, x);
    assert_eq!(yr, y);
}

#[test]
fn single_minority_sample_is_rejected() {
    let (x, y) = imbalanced(20, 1);
    match Smote::new(0.5, 1).fit_resample(&x, &y) {
        Err(ModelError::TooFewMinoritySamples { found: 1, .. }) => {}
        other => panic!("unexpected: {:?}", other.map(|(_, y)| y.len())),
    }
}

#[test]
fn ratio_outside_unit_interval_is_rejected() {
    let (x, y) = imbalanced(20, 5);
    assert!(Smote::new(1.5, 1).fit_resample(&x, &y).is_err());
    assert!(Smote::new(0.0, 1).fit_resample(&x, &y).is_err());
}

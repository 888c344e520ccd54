use tumor_lr::fixtures::SyntheticTumors;
use tumor_lr::loocv::{run_fold, run_loocv, run_loocv_parallel};
use tumor_lr::{AnalysisError, LoocvConfig};

const CONFIG: LoocvConfig = LoocvConfig {
    ridge_lambda: 0.02,
    lasso_lambda: 0.005,
    pca_components: 5,
};

#[test]
fn every_row_is_predicted_once() {
    let data = SyntheticTumors::new(50).seed(77).build();
    let report = run_loocv(&data, CONFIG).unwrap();

    assert_eq!(report.n, 50);
    assert_eq!(report.ridge.confusion.total(), 50);
    assert_eq!(report.lasso.confusion.total(), 50);
    assert_eq!(report.pca.confusion.total(), 50);
}

#[test]
fn parallel_and_sequential_agree() {
    let data = SyntheticTumors::new(45).seed(78).build();
    let sequential = run_loocv(&data, CONFIG).unwrap();
    let parallel = run_loocv_parallel(&data, CONFIG).unwrap();

    assert_eq!(sequential.ridge.confusion, parallel.ridge.confusion);
    assert_eq!(sequential.lasso.confusion, parallel.lasso.confusion);
    assert_eq!(sequential.pca.confusion, parallel.pca.confusion);
}

#[test]
fn held_out_prediction_ignores_training_order() {
    let data = SyntheticTumors::new(40).seed(79).build();
    // Rotate the rows so every other row lands at a new position.
    let rotated: Vec<usize> = (0..40).map(|i| (i + 13) % 40).collect();
    let moved = data.subset(&rotated).unwrap();

    for row in [0, 11, 27] {
        let new_position = rotated.iter().position(|&r| r == row).unwrap();
        assert_eq!(
            run_fold(&data, row, CONFIG).unwrap(),
            run_fold(&moved, new_position, CONFIG).unwrap()
        );
    }
}

#[test]
fn too_many_components_fails_the_first_fold() {
    let data = SyntheticTumors::new(20).seed(80).build();
    let config = LoocvConfig {
        pca_components: 31,
        ..CONFIG
    };
    match run_loocv(&data, config) {
        Err(AnalysisError::FoldFailed { fold, .. }) => assert_eq!(fold, 0),
        other => panic!("expected a failed fold, got {:?}", other.map(|r| r.n)),
    }
}

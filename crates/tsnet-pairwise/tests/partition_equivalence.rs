//! The partitioned path must reproduce the full-matrix engine exactly.

use tsnet_metrics::{
    BinRule, CorrelationDistance, CorrelationSign, DtwDistance, MetricError,
    MutualInformationDistance, Normalizer, SeriesDistance,
};
use tsnet_pairwise::{
    DistanceRecord, PairwiseConfig, PartitionConfig, SeriesCollection, merge_into, merge_records,
};

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

/// Five sines and five cosines with slightly different phases.
fn sines_and_cosines() -> SeriesCollection {
    let t: Vec<f64> = (0..100).map(|k| k as f64 * 0.1).collect();
    let mut values = Vec::new();
    let mut names = Vec::new();
    for k in 0..5 {
        let phase = k as f64 * 0.05;
        values.push(t.iter().map(|x| (x + phase).sin()).collect());
        names.push(format!("sin_{k}"));
    }
    for k in 0..5 {
        let phase = k as f64 * 0.05;
        values.push(t.iter().map(|x| (x + phase).cos()).collect());
        names.push(format!("cos_{k}"));
    }
    SeriesCollection::from_vecs(values).unwrap().with_names(names).unwrap()
}

fn partitioned<M: SeriesDistance>(
    series: &SeriesCollection,
    metric: &M,
    total_parts: usize,
    symmetric: bool,
) -> Vec<Vec<DistanceRecord>> {
    (1..=total_parts)
        .map(|part| {
            PartitionConfig::new(part, total_parts)
                .unwrap()
                .with_symmetric(symmetric)
                .with_concurrency(2)
                .compute(series, metric)
                .unwrap()
        })
        .collect()
}

fn assert_same_cells(a: &tsnet_pairwise::DistanceMatrix, b: &tsnet_pairwise::DistanceMatrix) {
    assert_eq!(a.len(), b.len());
    for (i, j, v) in a.iter() {
        let w = b.get(i, j);
        assert!(v == w || (v.is_nan() && w.is_nan()), "cell ({i}, {j}): {v} vs {w}");
    }
}

// ---------------------------------------------------------------------------
// a) partitions_merge_to_engine_matrix
// ---------------------------------------------------------------------------

#[test]
fn partitions_merge_to_engine_matrix() {
    let series = sines_and_cosines();
    let dtw = DtwDistance::unconstrained();
    let full = PairwiseConfig::new().compute(&series, &dtw).unwrap();

    for total in [1, 2, 3, 10] {
        let records: Vec<DistanceRecord> =
            partitioned(&series, &dtw, total, true).into_iter().flatten().collect();
        let merged = merge_records(records, series.len()).unwrap();
        assert_same_cells(&merged, &full);
    }
}

// ---------------------------------------------------------------------------
// b) asymmetric_partitions_merge_to_engine_matrix
// ---------------------------------------------------------------------------

#[test]
fn asymmetric_partitions_merge_to_engine_matrix() {
    let series = sines_and_cosines();
    let cor = CorrelationDistance::new(CorrelationSign::Positive);
    let full = PairwiseConfig::new().with_symmetric(false).compute(&series, &cor).unwrap();

    for total in [1, 2, 3, 10] {
        let batches = partitioned(&series, &cor, total, false);
        // merge in reverse order, one batch at a time
        let merged = batches
            .into_iter()
            .rev()
            .try_fold(tsnet_pairwise::DistanceMatrix::unfilled(series.len()), merge_into)
            .unwrap();
        assert_same_cells(&merged, &full);
    }
}

// ---------------------------------------------------------------------------
// c) failures_survive_partitioning
// ---------------------------------------------------------------------------

#[test]
fn failures_survive_partitioning() {
    let series = SeriesCollection::from_vecs(vec![
        vec![1.0, 2.0, 3.0],
        vec![1.0, 2.0],
        vec![2.0, 2.0, 1.0],
        vec![0.0, 1.0, 0.0],
    ])
    .unwrap();
    let strict = |a: &[f64], b: &[f64]| -> Result<f64, MetricError> {
        if a.len() != b.len() {
            return Err(MetricError::LengthMismatch { left: a.len(), right: b.len() });
        }
        Ok(a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum())
    };
    let full = PairwiseConfig::new().with_warn_on_error(false).compute(&series, &strict).unwrap();
    let records: Vec<DistanceRecord> =
        partitioned(&series, &strict, 3, true).into_iter().flatten().collect();
    let merged = merge_records(records, series.len()).unwrap();
    assert_same_cells(&merged, &full);
    assert!(merged.get(1, 3).is_nan());
}

// ---------------------------------------------------------------------------
// d) sine_cosine_scenario
// ---------------------------------------------------------------------------

/// Sines are far closer to each other than to any cosine under correlation distance.
#[test]
fn sine_cosine_scenario() {
    let series = sines_and_cosines();
    let cor = CorrelationDistance::new(CorrelationSign::Positive);
    let m = PairwiseConfig::new().with_concurrency(3).compute(&series, &cor).unwrap();

    assert_eq!(m.len(), 10);
    assert!(m.is_symmetric());
    assert!(!m.has_missing());
    for i in 0..10 {
        assert_eq!(m.get(i, i), 0.0);
        for j in 0..10 {
            let same_group = (i < 5) == (j < 5);
            if same_group {
                assert!(m.get(i, j) < 0.05, "({i}, {j}) = {}", m.get(i, j));
            } else {
                assert!(m.get(i, j) > 0.1, "({i}, {j}) = {}", m.get(i, j));
            }
        }
    }
    assert_eq!(m.names().unwrap()[5], "cos_0");
}

// ---------------------------------------------------------------------------
// e) outlier_series_under_data_dependent_bins
// ---------------------------------------------------------------------------

/// A single extreme value must not derail a whole mutual-information matrix.
#[test]
fn outlier_series_under_data_dependent_bins() {
    let wave = |phase: f64| -> Vec<f64> { (0..1000).map(|t| (t as f64 * 0.05 + phase).sin()).collect() };
    let mut spiked = wave(0.0);
    spiked[500] = 1e6;
    let series = SeriesCollection::from_vecs(vec![spiked, wave(0.7), wave(1.9)]).unwrap();
    let nmi = MutualInformationDistance::nmi(Normalizer::Mean)
        .with_bins(BinRule::FreedmanDiaconis)
        .unwrap();

    let m = PairwiseConfig::new().with_concurrency(2).compute(&series, &nmi).unwrap();
    assert!(!m.has_missing());
    assert!(m.is_symmetric());
    assert!(m.iter().all(|(_, _, d)| (0.0..=1.0).contains(&d)));
}

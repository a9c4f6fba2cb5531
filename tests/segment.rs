//!
//! end-to-end test of segmentation
//!
#[macro_use]
extern crate approx;

use phylohmm::hmm::mocks::{mock_two_state_emissions, mock_two_state_params};
use phylohmm::hmm::Posterior;
use phylohmm::io::{fasta, text};
use phylohmm::prelude::*;
use phylohmm::simulate::{sample_alignment, sample_path};
use phylohmm::train::path_accuracy;
use test_case::test_case;

#[test]
fn two_state_scenario() {
    let params = mock_two_state_params();
    let emissions = mock_two_state_emissions();
    let decoding = DecoderKind::Viterbi
        .decoder()
        .decode(&params, &emissions)
        .unwrap();
    assert_eq!(decoding.path, vec![0, 0, 0, 1, 1, 1]);
    assert_eq!(extract_intervals(&decoding.path, 0, 1), vec![Interval::new(1, 3).unwrap()]);

    let (posteriors, _) = Posterior::posteriors(&params, &emissions).unwrap();
    for i in 0..posteriors.n_columns() {
        let total: Prob = posteriors.column(i).iter().sum();
        assert_abs_diff_eq!(total.to_value(), 1.0, epsilon = 1e-9);
    }
}

fn models() -> Vec<TreeModel> {
    vec![
        TreeModel::parse("((0:0.02,1:0.02)0.02,(2:0.02,(3:0.02,4:0.02)0.01)0.02)", 5).unwrap(),
        TreeModel::parse("((0:0.6,1:0.6)0.3,(2:0.6,(3:0.6,4:0.6)0.3)0.3)", 5).unwrap(),
    ]
}

#[test_case(DecoderKind::Viterbi ; "viterbi")]
#[test_case(DecoderKind::Posterior ; "posterior")]
fn segment_simulated_alignment(decoder: DecoderKind) {
    let models = models();
    let truth_params = HmmParams::switching(2, 0.005).unwrap();
    let truth = sample_path(&truth_params, 4000, 17).unwrap();
    let alignment = sample_alignment(&models, &truth, 18).unwrap();

    // through a FASTA file on disk
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aln.fa");
    fasta::write_alignment(&path, &alignment).unwrap();
    let alignment = fasta::read_alignment(&path).unwrap();

    let config = TrainConfig {
        n_iterations: 4,
        decoder,
        unvisited_policy: UnvisitedPolicy::RetainPrevious,
        ..TrainConfig::default()
    };
    let seed_params = HmmParams::switching(2, 0.05).unwrap();
    let result = train(&models, &alignment, &seed_params, &config).unwrap();
    assert!(path_accuracy(&result.path, &truth).unwrap() > 0.9);

    let intervals = extract_intervals(&result.path, 0, 1);
    let true_intervals = extract_intervals(&truth, 0, 1);
    assert!(!intervals.is_empty());
    // covered positions mostly agree with the true conserved segments
    let n_covered: usize = intervals.iter().map(|x| x.len()).sum();
    let n_true: usize = true_intervals.iter().map(|x| x.len()).sum();
    let ratio = n_covered as f64 / n_true as f64;
    assert!(ratio > 0.7 && ratio < 1.3, "ratio={}", ratio);

    let out = dir.path().join("intervals.txt");
    text::write_intervals(&out, &intervals).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written.lines().next(), Some(intervals[0].to_string().as_str()));
}

#[test]
fn malformed_topology_is_rejected() {
    let r = TreeModel::parse("((0:0.1,1:0.1)0.1,7:0.1)", 5);
    assert!(matches!(r, Err(PhyloHmmError::MalformedTopology(_))));
}

#[test]
fn degenerate_column_is_fatal() {
    let models = vec![
        TreeModel::parse("(0:0,1:0)", 2).unwrap(),
        TreeModel::parse("(0:0,1:0)", 2).unwrap(),
    ];
    let alignment = Alignment::from_seqs(&[b"ACGT", b"ACTT"]).unwrap();
    let emissions = EmissionMatrix::build(&models, &alignment, false).unwrap();
    assert_eq!(emissions.degenerate_columns(), vec![2]);
    let params = HmmParams::uniform(2).unwrap();
    for kind in [DecoderKind::Viterbi, DecoderKind::Posterior] {
        assert!(matches!(
            kind.decoder().decode(&params, &emissions),
            Err(PhyloHmmError::DegenerateColumn(2))
        ));
    }
}

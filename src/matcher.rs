//! Nearest-neighbor matching of detected faces against the encoding store.
//!
//! This is a classification policy over stored vectors, not a learned model:
//! a detected face matches the enrollment with the minimum Euclidean distance,
//! provided that distance is within the tolerance.

use std::collections::BTreeSet;

use rollcall_vision::Detection;

use crate::scanner::ScannedFace;
use crate::store::{EncodingStore, Enrollment};

/// Outcome for one detected face.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceMatch {
    Matched {
        /// Index of the enrollment in the store.
        index: usize,
        distance: f32,
    },
    Unmatched,
}

/// Everything learned from matching one classroom image.
#[derive(Debug)]
pub struct ScanOutcome {
    /// IDs of identities matched by at least one detected face.
    pub present: BTreeSet<String>,
    /// Per detected face, in detection order, for display.
    pub faces: Vec<(Detection, FaceMatch)>,
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Find the enrollment nearest to `probe`.
///
/// Equal minimum distances resolve to the earliest enrollment (strict `<`
/// while scanning), and only a minimum within `tolerance` counts as a match.
pub fn nearest(entries: &[Enrollment], probe: &[f32], tolerance: f32) -> FaceMatch {
    let mut best: Option<(usize, f32)> = None;
    for (index, entry) in entries.iter().enumerate() {
        let distance = euclidean_distance(&entry.embedding, probe);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    match best {
        Some((index, distance)) if distance <= tolerance => FaceMatch::Matched { index, distance },
        _ => FaceMatch::Unmatched,
    }
}

/// Match every detected face against the store. Multiple faces matching the
/// same identity collapse into a single Present.
pub fn match_scan(store: &EncodingStore, faces: Vec<ScannedFace>, tolerance: f32) -> ScanOutcome {
    let mut present = BTreeSet::new();
    let mut labelled = Vec::with_capacity(faces.len());

    for face in faces {
        let outcome = nearest(&store.entries, &face.embedding, tolerance);
        if let FaceMatch::Matched { index, .. } = outcome {
            present.insert(store.entries[index].identity.id.clone());
        }
        labelled.push((face.detection, outcome));
    }

    ScanOutcome {
        present,
        faces: labelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Identity;

    fn enrollment(name: &str, id: &str, embedding: Vec<f32>) -> Enrollment {
        Enrollment {
            identity: Identity {
                name: name.into(),
                id: id.into(),
            },
            embedding,
        }
    }

    fn face(embedding: Vec<f32>) -> ScannedFace {
        ScannedFace {
            detection: Detection {
                bbox: [0.0; 4],
                score: 0.9,
                landmarks: [0.0; 10],
            },
            embedding,
        }
    }

    #[test]
    fn nearest_picks_minimum_distance() {
        let entries = vec![
            enrollment("alice", "1", vec![1.0, 0.0]),
            enrollment("bob", "2", vec![0.0, 1.0]),
        ];
        match nearest(&entries, &[0.1, 0.9], 0.55) {
            FaceMatch::Matched { index, distance } => {
                assert_eq!(index, 1);
                assert!(distance < 0.2);
            }
            FaceMatch::Unmatched => panic!("expected a match"),
        }
    }

    #[test]
    fn distance_above_tolerance_is_unmatched() {
        let entries = vec![enrollment("alice", "1", vec![1.0, 0.0])];
        assert_eq!(nearest(&entries, &[-1.0, 0.0], 0.55), FaceMatch::Unmatched);
    }

    #[test]
    fn distance_equal_to_tolerance_matches() {
        let entries = vec![enrollment("alice", "1", vec![0.0, 0.0])];
        match nearest(&entries, &[0.5, 0.0], 0.5) {
            FaceMatch::Matched { distance, .. } => assert!((distance - 0.5).abs() < 1e-6),
            FaceMatch::Unmatched => panic!("boundary distance must match"),
        }
    }

    #[test]
    fn ties_resolve_to_earliest_enrollment() {
        let entries = vec![
            enrollment("alice", "1", vec![1.0, 0.0]),
            enrollment("bob", "2", vec![1.0, 0.0]), // equidistant duplicate
        ];
        match nearest(&entries, &[1.0, 0.1], 0.55) {
            FaceMatch::Matched { index, .. } => assert_eq!(index, 0),
            FaceMatch::Unmatched => panic!("expected a match"),
        }
    }

    #[test]
    fn empty_store_never_matches() {
        assert_eq!(nearest(&[], &[1.0, 0.0], 10.0), FaceMatch::Unmatched);
    }

    #[test]
    fn duplicate_matches_collapse_to_one_present() {
        let store = EncodingStore {
            entries: vec![enrollment("alice", "1", vec![1.0, 0.0])],
        };
        let faces = vec![face(vec![1.0, 0.0]), face(vec![0.99, 0.01])];
        let outcome = match_scan(&store, faces, 0.55);

        assert_eq!(outcome.present.len(), 1);
        assert!(outcome.present.contains("1"));
        assert_eq!(outcome.faces.len(), 2);
    }

    #[test]
    fn matching_is_deterministic() {
        let store = EncodingStore {
            entries: vec![
                enrollment("alice", "1", vec![1.0, 0.0, 0.0]),
                enrollment("bob", "2", vec![0.0, 1.0, 0.0]),
            ],
        };
        let probe = vec![0.9, 0.1, 0.0];

        let first = match_scan(&store, vec![face(probe.clone())], 0.55);
        for _ in 0..10 {
            let again = match_scan(&store, vec![face(probe.clone())], 0.55);
            assert_eq!(again.present, first.present);
            assert_eq!(again.faces[0].1, first.faces[0].1);
        }
    }
}

//! Detection pipeline

pub mod content;
pub mod detect;
pub mod fingerprint;
pub mod grouping;
pub mod scan;
pub mod similarity;

pub use detect::{CancelToken, DetectionRun, Detector, RunState};
pub use fingerprint::ContentFingerprinter;
pub use grouping::DuplicateGrouper;
pub use scan::{scan_directory, ScanFilters, ScanResult};
pub use similarity::{cosine, is_duplicate, SimilarityMatcher, Threshold};

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from stonecrack for tests
pub use stonecrack::{
    BoundingBox, CrackDetector, DetectionError, DetectionResult, DetectorConfig, FixedScore,
    Material, SessionId,
};

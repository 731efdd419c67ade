pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;

pub use config::DetectorConfig;
pub use detection::CrackDetector;
pub use detection::confidence::{EntropyBand, FixedScore, HealthyScore, SeededBand};
pub use error::DetectionError;
pub use models::{BoundingBox, Contour, DetectionResult, DetectionSummary, Material};
pub use session::{SessionCache, SessionId};
pub use storage::{StoredImage, UploadStore};

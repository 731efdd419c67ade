use crate::session::SessionId;

/// Failures reported by the detection core.
///
/// Everything else the core does ends in a fully populated
/// [`DetectionResult`](crate::models::DetectionResult).
#[derive(thiserror::Error, Debug)]
pub enum DetectionError {
    #[error("image could not be decoded")]
    UnreadableImage(#[source] image::ImageError),

    #[error("image has no pixels: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("no image has been analyzed for session {0}")]
    NoPriorSession(SessionId),

    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),

    #[error("annotated image could not be encoded")]
    Encode(#[source] image::ImageError),
}

//! Client side of the pipeline - normalization, gateway requests, session state

pub mod normalizer;
pub mod service;
pub mod session;

pub use normalizer::{normalize_image, ImageFile, NormalizedImage, DEFAULT_MAX_DIMENSION};
pub use service::{GatewayClient, ImageGenerator};
pub use session::{EditorSession, SessionState, Style};

//! Provider module - the external image-edit API behind the gateway

pub mod openai;
pub mod traits;

pub use openai::OpenAiProvider;
pub use traits::{EditRequest, EditResponse, EditedImage, ImageEditProvider, ResultFormat};

//! Gateway module - payload validation and relay to the image provider

pub mod generation;

pub use generation::{GenerateImageRequest, GenerateImageResponse, GenerationGateway};

//! Transport layer: Triton gRPC client for classification and segmentation models.

#[cfg(feature = "grpc")]
pub mod proto;
#[cfg(feature = "grpc")]
pub mod triton;

#[cfg(feature = "grpc")]
pub use triton::{ClientConfig, ClientError, DEFAULT_TIMEOUT, TritonClient};

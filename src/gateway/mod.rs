//! Gateway module - Request handling, upload staging and the result archive

pub mod archive;
pub mod staging;
pub mod tryon;

pub use tryon::{
    FallbackReason, GatewayOptions, RawParams, RequestPolicy, TryOnGateway, TryOnOutcome,
    TryOnRequest, TryOnResponse, TryOnResult,
};

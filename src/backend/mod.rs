//! Backend module - Traits, device selection, the remote worker client and the shared handle

pub mod device;
pub mod handle;
pub mod http_backend;
pub mod traits;

pub use handle::BackendHandle;
pub use traits::{
    GenerationInputs, GenerationOutput, LoadedBackend, ModelLoader, ModelProvider, Readiness,
    SamplingParams, TryOnModel,
};

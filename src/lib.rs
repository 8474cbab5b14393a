#[path = "../crates/sdk-types/src/lib.rs"]
pub mod types;
#[path = "../crates/core/src/lib.rs"]
pub mod core;
#[path = "../crates/provider/src/lib.rs"]
pub mod provider;

#[path = "../crates/providers/transformers/src/lib.rs"]
pub mod provider_transformers;

pub mod providers {
    pub use crate::provider_transformers as transformers;
}

pub(crate) use crate::core as ai_sdk_core;
pub(crate) use crate::provider as ai_sdk_provider;
pub(crate) use crate::types as ai_sdk_types;

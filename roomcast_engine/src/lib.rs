//! Host side of roomcast: configuration, the reasoning-service client,
//! model loading, and the instruction orchestrator that drives a
//! [`roomcast_core::RoomSession`].

pub mod assets;
pub mod cli;
pub mod commands;
pub mod config;
pub mod gemini;
pub mod orchestrator;
pub mod reasoning;

pub use assets::{bounds_from_gltf, AssetCompletion, GltfAssetLoader};
pub use config::EngineConfig;
pub use gemini::GeminiClient;
pub use orchestrator::{
    InstructionFailure, InstructionOutcome, InstructionPhase, InstructionReport, Orchestrator,
    ServiceReply,
};
pub use reasoning::{OfflineService, ReasoningService, TransportError};

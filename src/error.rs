// ==============================================================================
// error.rs - ERROR TYPES
// ------------------------------------------------------------------------------
// InitError   : vehicle / animator initialization refusals (vehicle stays inert)
// CodecError  : wire encode/decode (bincode frames, JSON snapshots)
// ConfigError : server config loading
// ==============================================================================

use crate::curve::CurveKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("physics simulation is disabled for sequencer-driven vehicles")]
    DisabledInSequencer,

    #[error("vehicle has no simulating root body")]
    MissingRootBody,

    #[error("{0} curve is missing")]
    MissingCurve(CurveKind),

    #[error("root component must be a skeletal mesh")]
    SkeletalMeshExpected,

    #[error("root component must be a static mesh")]
    StaticMeshExpected,

    #[error("static mesh vehicle has no visual mesh attached")]
    MissingVisualMesh,

    #[error("wheel count ({wheels}) does not match suspension spring count ({springs})")]
    WheelCountMismatch { wheels: usize, springs: usize },

    #[error("no wheel mesh attached at socket `{0}`")]
    MissingWheelMesh(String),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type InitResult<T = ()> = std::result::Result<T, InitError>;

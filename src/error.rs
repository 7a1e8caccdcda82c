//! Errors surfaced by region generation.

use thiserror::Error;

use crate::region::RegionKind;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("grid dimensions must be odd, got {width}x{height}")]
    EvenDimensions { width: usize, height: usize },

    #[error("{requested} buildings do not fit a {width}x{height} town (limit {limit})")]
    TooManyBuildings {
        requested: usize,
        limit: usize,
        width: usize,
        height: usize,
    },

    #[error("town of {width}x{height} cannot hold buildings up to {max_building} tiles wide")]
    GridTooSmall {
        width: usize,
        height: usize,
        max_building: usize,
    },

    #[error("invalid generator configuration: {0}")]
    InvalidConfig(String),

    #[error("region '{region}' failed the connectivity check {attempts} times")]
    ConnectivityExhausted { region: String, attempts: usize },

    #[error("placed {placed} of {requested} buildings before running out of {attempts} attempts")]
    PlacementExhausted {
        placed: usize,
        requested: usize,
        attempts: usize,
    },

    #[error("region '{region}' has {available} free ground tiles, {required} needed")]
    NotEnoughGround {
        region: String,
        available: usize,
        required: usize,
    },

    #[error("first request for {kind:?} region '{region}' is missing its parameters")]
    MissingParameters { region: String, kind: RegionKind },

    #[error("unknown settlement '{0}'")]
    UnknownSettlement(String),

    #[error("region '{0}' has not been generated")]
    UnknownRegion(String),
}

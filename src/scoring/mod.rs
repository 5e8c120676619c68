//! Remote anomaly scoring
//!
//! The detection itself runs inside the hosted service; this module only
//! shapes the request, performs the call and decodes what comes back.

pub mod client;
pub mod response;
pub mod wire;

pub use client::{ScoringClient, ScoringService};
pub use response::{EncodedPlot, OutputTable, ScoringResponse, GRAPHICS_DEVICE_KEY};

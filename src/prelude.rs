//! Prelude module that re-exports commonly used types and traits.
//!
//! This module provides a convenient way to import the most commonly used
//! types, traits, and functions from the tickflow-rs crate. Instead of
//! importing each type individually, you can use:
//!
//! ```rust
//! use tickflow_rs::prelude::*;
//! ```
//!
//! This will import all the essential types needed for working with the
//! tick-flow pipeline.

// Core flow types
pub use crate::flow::{BookFlow, LiquidationFlow, OpenInterestFlow, TradeFlow};
pub use crate::flow::{FlowError, FlowKind, Side};

// Manager types
pub use crate::flow::manager::{FlowManager, FlowManagerStd, FlowManagerTokio, VenueFlows};

// Matrix and level types
pub use crate::flow::{FillPolicy, HeatmapGrid, Level, MinuteMatrix, ResetPolicy, WriteMode};

// Tick records
pub use crate::flow::{BookUpdate, LiquidationTick, OpenInterestTick, TradeTick};

// Snapshot types
pub use crate::flow::{
    BookSnapshot, LiquidationSnapshot, OpenInterestSnapshot, SnapshotEvent, SnapshotListener,
    SnapshotPackage, SnapshotPayload, TradeSnapshot,
};

// Merge and statistics types
pub use crate::flow::{
    MergeEngine, MergeError, MergedBooks, MergedLiquidations, MergedOpenInterest, MergedTrades,
    SnapshotBoard, StatFlags,
};

// Void inference
pub use crate::flow::{VoidSnapshot, infer_voids};

// Utility functions
pub use crate::utils::current_time_millis;

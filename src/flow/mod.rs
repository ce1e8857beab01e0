//! Tick-flow heatmap pipeline: per-venue rolling-minute flows, cross-venue
//! merging, and void inference.

pub mod book;
pub mod error;
/// Price-to-level bucketing.
pub mod level;
pub mod liquidations;
/// Multi-venue flow management with centralized snapshot routing.
pub mod manager;
pub mod matrix;
pub mod merge;
pub mod open_interest;
pub mod snapshot;
/// Derived statistics for merged heatmaps.
pub mod statistics;
mod tests;
pub mod tick;
pub mod trades;
/// Void (canceled liquidity) inference.
pub mod voids;

pub use book::{BookDepth, BookFlow, DEFAULT_BOOK_CEILING_PCT};
pub use error::FlowError;
pub use level::{Level, percent_distance};
pub use liquidations::LiquidationFlow;
pub use manager::{FlowManager, FlowManagerStd, FlowManagerTokio, VenueFlows};
pub use matrix::{
    FillPolicy, HeatmapGrid, MinuteMatrix, ResetPolicy, SLOTS, SecondCursor, WriteMode,
};
pub use merge::{
    MergeEngine, MergeError, MergedBooks, MergedLiquidations, MergedOpenInterest, MergedTrades,
    SnapshotBoard,
};
pub use open_interest::OpenInterestFlow;
pub use snapshot::{
    BookSnapshot, FLOW_SNAPSHOT_FORMAT_VERSION, LiquidationSnapshot, OpenInterestSnapshot,
    SnapshotError, SnapshotEvent, SnapshotListener, SnapshotPackage, SnapshotPayload,
    TradeSnapshot,
};
pub use statistics::{
    BookStats, LiquidationStats, OpenInterestStats, PriceOhlc, StatFlags, TradeStats,
    sample_variance,
};
pub use tick::{BookUpdate, FlowKind, LiquidationTick, OpenInterestTick, Side, TradeTick};
pub use trades::TradeFlow;
pub use voids::{VoidSnapshot, infer_voids};

//! # Multi-Venue Tick-Flow Heatmap Engine
//!
//! A second-resolution price-level aggregation pipeline for high-frequency market data, written in Rust. This project converts normalized tick streams (order-book updates, trades, open-interest readings, liquidations) into fixed-shape rolling-minute heatmaps, merges them across venues, and derives order-flow statistics.
//!
//! ## Key Features
//!
//! - **Rolling-Minute Heatmaps**: Every flow accumulates amounts into a 60-row (one per wall-clock second) by N-column (one per discretized price level) matrix, freezing a gap-filled, immutable snapshot at each minute boundary.
//!
//! - **Four Flow Kinds**: Order books (full-depth recompute with a maintained resting book), trades (per-aggressor-side accumulation), open interest (deltas of a cumulative series), and liquidations (per-position-side accumulation) — all built on one shared matrix with explicit write modes.
//!
//! - **Dynamic Price Levels**: Levels are discovered as prices are observed; new columns retroactively exist as zeros for earlier seconds of the minute, so every snapshot keeps a consistent rectangular shape.
//!
//! - **Cross-Venue Merging**: Same-instrument snapshots from any number of venues are aligned on the union of levels, zero-padded, and summed element-wise; slow or missing venues degrade the result instead of blocking it.
//!
//! - **Derived Statistics**: OHLC and price variance for books, per-level variance, total volume and buy/sell dominance for trades, net change for open interest, totals for liquidations — individually selectable via bitflags.
//!
//! - **Void Inference**: Consecutive-second differencing of merged books against merged trades estimates resting volume that vanished without a matching trade (inferred cancellations).
//!
//! - **Atomic Snapshot Handoff**: Snapshots are immutable `Arc`s published onto a concurrent board, so merge and statistics can run on other threads without observing partial state.
//!
//! ## Design Goals
//!
//! This aggregation engine is built with the following design principles:
//!
//! 1. **Consistency**: Every snapshot has exactly 60 second slots and a rectangular level set, no matter how sparse the input minute was.
//! 2. **Fidelity**: Accumulate-vs-overwrite semantics are explicit per flow kind, and gap filling distinguishes resting state from event counts.
//! 3. **Isolation**: One flow per (venue, instrument, kind); no shared mutable state between feeds, no locks on the hot path.
//! 4. **Degradation over failure**: Invalid ticks are dropped and reported; merges proceed with whichever venues have published.
//!
//! ## Use Cases
//!
//! - **Order-Flow Analytics**: Heatmaps of traded and canceled liquidity by price level for execution research
//! - **Cross-Venue Dashboards**: Unified per-instrument views over fragmented liquidity
//! - **Signal Research**: Dominance, void volume, and OI-delta series as model inputs
//! - **Market Microstructure**: Studying where resting liquidity appears and disappears around trades
//!
//! ## Pipeline
//!
//! ```text
//! normalized ticks (per venue)
//!        │
//!   ┌────▼─────┐   one per (venue, kind)
//!   │  *Flow   │   BookFlow / TradeFlow / OpenInterestFlow / LiquidationFlow
//!   └────┬─────┘
//!        │ minute rollover → frozen snapshot (Arc)
//!   ┌────▼─────────┐
//!   │SnapshotBoard │  latest snapshot per (venue, kind)
//!   └────┬─────────┘
//!        │
//!   ┌────▼─────┐
//!   │MergeEngine│ → MergedBooks / MergedTrades / MergedOpenInterest / MergedLiquidations
//!   └────┬─────┘
//!        │
//!   ┌────▼─────┐
//!   │infer_voids│ → VoidSnapshot
//!   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tickflow_rs::prelude::*;
//!
//! let mut trades = TradeFlow::new("alpha", "BTC-PERP", 5.0);
//!
//! // One minute of ticks, then the first tick of the next minute
//! trades
//!     .update(&TradeTick { timestamp: 1_700_000_005, side: Side::Buy, price: 100.0, amount: 1.0 })
//!     .unwrap();
//! trades
//!     .update(&TradeTick { timestamp: 1_700_000_062, side: Side::Sell, price: 102.0, amount: 2.0 })
//!     .unwrap();
//!
//! // The rollover froze the previous minute
//! let snapshot = trades.snapshot().expect("published at rollover");
//! assert_eq!(snapshot.symbol, "BTC-PERP");
//! ```
//!
//! ## Status
//!
//! The core aggregation, merge, and void-inference layers are stable. Venue
//! adapters, persistence, and the options open-interest subsystem live in
//! separate crates.

pub mod flow;

pub mod prelude;
mod utils;

pub use flow::manager::{FlowManager, FlowManagerStd, FlowManagerTokio, VenueFlows};
pub use flow::merge::{
    MergeEngine, MergeError, MergedBooks, MergedLiquidations, MergedOpenInterest, MergedTrades,
    SnapshotBoard,
};
pub use flow::snapshot::{
    BookSnapshot, FLOW_SNAPSHOT_FORMAT_VERSION, LiquidationSnapshot, OpenInterestSnapshot,
    SnapshotError, SnapshotEvent, SnapshotListener, SnapshotPackage, SnapshotPayload,
    TradeSnapshot,
};
pub use flow::statistics::{
    BookStats, LiquidationStats, OpenInterestStats, PriceOhlc, StatFlags, TradeStats,
};
pub use flow::voids::{VoidSnapshot, infer_voids};
pub use flow::{
    BookDepth, BookFlow, BookUpdate, DEFAULT_BOOK_CEILING_PCT, FillPolicy, FlowError, FlowKind,
    HeatmapGrid, Level, LiquidationFlow, LiquidationTick, MinuteMatrix, OpenInterestFlow,
    OpenInterestTick, ResetPolicy, SLOTS, SecondCursor, Side, TradeFlow, TradeTick, WriteMode,
};
pub use utils::current_time_millis;

//! Multi-venue flow management with centralized snapshot routing.
//!
//! This module provides venue management through a trait-based design, with
//! implementations for both standard library (`FlowManagerStd`) and Tokio
//! (`FlowManagerTokio`) channels. The manager owns one [`VenueFlows`] bundle
//! per venue, wires every flow's snapshot listener to a channel, and runs a
//! processor that moves published snapshots onto the shared
//! [`SnapshotBoard`] where the merge engine reads them.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use super::book::BookFlow;
use super::liquidations::LiquidationFlow;
use super::merge::{
    MergeEngine, MergeError, MergedBooks, MergedLiquidations, MergedOpenInterest, MergedTrades,
    SnapshotBoard,
};
use super::open_interest::OpenInterestFlow;
use super::snapshot::{SnapshotEvent, SnapshotListener};
use super::trades::TradeFlow;
use super::voids::{VoidSnapshot, infer_voids};

/// All four flows for one venue of one instrument.
pub struct VenueFlows {
    /// Order-book flow.
    pub books: BookFlow,
    /// Trade flow.
    pub trades: TradeFlow,
    /// Open-interest flow.
    pub open_interest: OpenInterestFlow,
    /// Liquidation flow.
    pub liquidations: LiquidationFlow,
}

impl VenueFlows {
    fn new(venue: &str, symbol: &str, level_size: f64, listener: SnapshotListener) -> Self {
        Self {
            books: BookFlow::new(venue, symbol, level_size)
                .with_snapshot_listener(Arc::clone(&listener)),
            trades: TradeFlow::new(venue, symbol, level_size)
                .with_snapshot_listener(Arc::clone(&listener)),
            open_interest: OpenInterestFlow::new(venue, symbol, level_size)
                .with_snapshot_listener(Arc::clone(&listener)),
            liquidations: LiquidationFlow::new(venue, symbol, level_size)
                .with_snapshot_listener(listener),
        }
    }
}

/// Trait for managing per-venue flows with centralized snapshot routing.
///
/// This trait defines the interface for flow managers, allowing different
/// implementations using various channel types (std::mpsc, tokio::mpsc, etc.).
pub trait FlowManager {
    /// Add the four flows for a venue with an automatically configured
    /// snapshot listener.
    fn add_venue(&mut self, venue: &str);

    /// Get a reference to a venue's flows.
    fn get_flows(&self, venue: &str) -> Option<&VenueFlows>;

    /// Get a mutable reference to a venue's flows.
    fn get_flows_mut(&mut self, venue: &str) -> Option<&mut VenueFlows>;

    /// Get the list of all registered venues.
    fn venues(&self) -> Vec<String>;

    /// Remove a venue's flows.
    fn remove_venue(&mut self, venue: &str) -> Option<VenueFlows>;

    /// Check if a venue is registered.
    fn has_venue(&self, venue: &str) -> bool;

    /// Get the number of registered venues.
    fn venue_count(&self) -> usize;
}

/// FlowManager implementation using standard library mpsc channels.
pub struct FlowManagerStd {
    symbol: String,
    level_size: f64,
    /// Per-venue flows indexed by venue name
    flows: HashMap<String, VenueFlows>,
    /// Shared registry of published snapshots
    board: Arc<SnapshotBoard>,
    /// Merge engine for this instrument
    engine: MergeEngine,
    /// Sender for snapshot events
    snapshot_sender: std::sync::mpsc::Sender<SnapshotEvent>,
    /// Receiver for snapshot events (taken when processor starts)
    snapshot_receiver: Option<std::sync::mpsc::Receiver<SnapshotEvent>>,
}

impl FlowManagerStd {
    /// Create a new FlowManagerStd with a standard library mpsc channel.
    pub fn new(symbol: &str, level_size: f64) -> Self {
        let (sender, receiver) = std::sync::mpsc::channel();

        Self {
            symbol: symbol.to_string(),
            level_size,
            flows: HashMap::new(),
            board: Arc::new(SnapshotBoard::new()),
            engine: MergeEngine::new(symbol),
            snapshot_sender: sender,
            snapshot_receiver: Some(receiver),
        }
    }

    /// The shared snapshot board.
    pub fn board(&self) -> Arc<SnapshotBoard> {
        Arc::clone(&self.board)
    }

    /// The merge engine, exposing the last merged output per kind.
    pub fn engine(&self) -> &MergeEngine {
        &self.engine
    }

    /// Start the snapshot processor in a separate thread.
    pub fn start_snapshot_processor(&mut self) -> std::thread::JoinHandle<()> {
        let receiver = self
            .snapshot_receiver
            .take()
            .expect("Snapshot processor already started");
        let board = Arc::clone(&self.board);

        std::thread::spawn(move || {
            info!("Snapshot processor started");

            while let Ok(event) = receiver.recv() {
                Self::process_snapshot_event(&board, &event);
            }

            info!("Snapshot processor stopped");
        })
    }

    /// Move any pending snapshot events onto the board without a processor
    /// thread. Returns the number of events processed. Useful for callers
    /// that drive everything from one thread.
    pub fn drain_pending(&mut self) -> usize {
        let mut processed = 0;
        if let Some(receiver) = &self.snapshot_receiver {
            while let Ok(event) = receiver.try_recv() {
                Self::process_snapshot_event(&self.board, &event);
                processed += 1;
            }
        }
        processed
    }

    /// Process a single snapshot event.
    fn process_snapshot_event(board: &SnapshotBoard, event: &SnapshotEvent) {
        info!(
            "Publishing {} snapshot for {} from {}",
            event.payload.kind(),
            event.symbol,
            event.venue
        );
        board.publish(event);
    }

    /// Merge the latest book snapshots from every venue that has published.
    pub fn merged_books(&mut self) -> Option<Arc<MergedBooks>> {
        let snapshots = self.board.books();
        Self::unwrap_merge(self.engine.merge_books(&snapshots))
    }

    /// Merge the latest trade snapshots from every venue that has published.
    pub fn merged_trades(&mut self) -> Option<Arc<MergedTrades>> {
        let snapshots = self.board.trades();
        Self::unwrap_merge(self.engine.merge_trades(&snapshots))
    }

    /// Merge the latest open-interest snapshots from every venue that has
    /// published.
    pub fn merged_open_interest(&mut self) -> Option<Arc<MergedOpenInterest>> {
        let snapshots = self.board.open_interest();
        Self::unwrap_merge(self.engine.merge_open_interest(&snapshots))
    }

    /// Merge the latest liquidation snapshots from every venue that has
    /// published.
    pub fn merged_liquidations(&mut self) -> Option<Arc<MergedLiquidations>> {
        let snapshots = self.board.liquidations();
        Self::unwrap_merge(self.engine.merge_liquidations(&snapshots))
    }

    /// Infer void liquidity from the latest merged books and trades, absent
    /// until both kinds have a merged snapshot.
    pub fn void_snapshot(&mut self) -> Option<VoidSnapshot> {
        let books = self.merged_books()?;
        let trades = self.merged_trades()?;
        Some(infer_voids(&books, &trades))
    }

    fn unwrap_merge<T>(result: Result<T, MergeError>) -> Option<T> {
        match result {
            Ok(merged) => Some(merged),
            Err(MergeError::NoSnapshots { .. }) => None,
            Err(e) => {
                error!("Merge failed: {}", e);
                None
            }
        }
    }
}

impl FlowManager for FlowManagerStd {
    fn add_venue(&mut self, venue: &str) {
        let sender = self.snapshot_sender.clone();
        let venue_clone = venue.to_string();

        let listener: SnapshotListener = Arc::new(move |event: &SnapshotEvent| {
            if let Err(e) = sender.send(event.clone()) {
                error!("Failed to send snapshot event for {}: {}", venue_clone, e);
            }
        });

        let flows = VenueFlows::new(venue, &self.symbol, self.level_size, listener);
        self.flows.insert(venue.to_string(), flows);
        info!("Added flows for venue: {}", venue);
    }

    fn get_flows(&self, venue: &str) -> Option<&VenueFlows> {
        self.flows.get(venue)
    }

    fn get_flows_mut(&mut self, venue: &str) -> Option<&mut VenueFlows> {
        self.flows.get_mut(venue)
    }

    fn venues(&self) -> Vec<String> {
        self.flows.keys().cloned().collect()
    }

    fn remove_venue(&mut self, venue: &str) -> Option<VenueFlows> {
        let result = self.flows.remove(venue);
        if result.is_some() {
            info!("Removed flows for venue: {}", venue);
        }
        result
    }

    fn has_venue(&self, venue: &str) -> bool {
        self.flows.contains_key(venue)
    }

    fn venue_count(&self) -> usize {
        self.flows.len()
    }
}

/// FlowManager implementation using Tokio mpsc channels.
pub struct FlowManagerTokio {
    symbol: String,
    level_size: f64,
    /// Per-venue flows indexed by venue name
    flows: HashMap<String, VenueFlows>,
    /// Shared registry of published snapshots
    board: Arc<SnapshotBoard>,
    /// Merge engine for this instrument
    engine: MergeEngine,
    /// Sender for snapshot events
    snapshot_sender: tokio::sync::mpsc::UnboundedSender<SnapshotEvent>,
    /// Receiver for snapshot events (taken when processor starts)
    snapshot_receiver: Option<tokio::sync::mpsc::UnboundedReceiver<SnapshotEvent>>,
}

impl FlowManagerTokio {
    /// Create a new FlowManagerTokio with a Tokio unbounded mpsc channel.
    pub fn new(symbol: &str, level_size: f64) -> Self {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();

        Self {
            symbol: symbol.to_string(),
            level_size,
            flows: HashMap::new(),
            board: Arc::new(SnapshotBoard::new()),
            engine: MergeEngine::new(symbol),
            snapshot_sender: sender,
            snapshot_receiver: Some(receiver),
        }
    }

    /// The shared snapshot board.
    pub fn board(&self) -> Arc<SnapshotBoard> {
        Arc::clone(&self.board)
    }

    /// The merge engine, exposing the last merged output per kind.
    pub fn engine(&self) -> &MergeEngine {
        &self.engine
    }

    /// Start the snapshot processor as an async task.
    ///
    /// Returns a JoinHandle for the spawned task.
    pub fn start_snapshot_processor(&mut self) -> tokio::task::JoinHandle<()> {
        let mut receiver = self
            .snapshot_receiver
            .take()
            .expect("Snapshot processor already started");
        let board = Arc::clone(&self.board);

        tokio::spawn(async move {
            info!("Snapshot processor started (Tokio)");

            while let Some(event) = receiver.recv().await {
                Self::process_snapshot_event(&board, &event);
            }

            info!("Snapshot processor stopped (Tokio)");
        })
    }

    /// Move any pending snapshot events onto the board without a processor
    /// task. Returns the number of events processed.
    pub fn drain_pending(&mut self) -> usize {
        let mut processed = 0;
        if let Some(receiver) = &mut self.snapshot_receiver {
            while let Ok(event) = receiver.try_recv() {
                Self::process_snapshot_event(&self.board, &event);
                processed += 1;
            }
        }
        processed
    }

    /// Process a single snapshot event.
    fn process_snapshot_event(board: &SnapshotBoard, event: &SnapshotEvent) {
        info!(
            "Publishing {} snapshot for {} from {}",
            event.payload.kind(),
            event.symbol,
            event.venue
        );
        board.publish(event);
    }

    /// Merge the latest book snapshots from every venue that has published.
    pub fn merged_books(&mut self) -> Option<Arc<MergedBooks>> {
        let snapshots = self.board.books();
        FlowManagerStd::unwrap_merge(self.engine.merge_books(&snapshots))
    }

    /// Merge the latest trade snapshots from every venue that has published.
    pub fn merged_trades(&mut self) -> Option<Arc<MergedTrades>> {
        let snapshots = self.board.trades();
        FlowManagerStd::unwrap_merge(self.engine.merge_trades(&snapshots))
    }

    /// Merge the latest open-interest snapshots from every venue that has
    /// published.
    pub fn merged_open_interest(&mut self) -> Option<Arc<MergedOpenInterest>> {
        let snapshots = self.board.open_interest();
        FlowManagerStd::unwrap_merge(self.engine.merge_open_interest(&snapshots))
    }

    /// Merge the latest liquidation snapshots from every venue that has
    /// published.
    pub fn merged_liquidations(&mut self) -> Option<Arc<MergedLiquidations>> {
        let snapshots = self.board.liquidations();
        FlowManagerStd::unwrap_merge(self.engine.merge_liquidations(&snapshots))
    }

    /// Infer void liquidity from the latest merged books and trades, absent
    /// until both kinds have a merged snapshot.
    pub fn void_snapshot(&mut self) -> Option<VoidSnapshot> {
        let books = self.merged_books()?;
        let trades = self.merged_trades()?;
        Some(infer_voids(&books, &trades))
    }
}

impl FlowManager for FlowManagerTokio {
    fn add_venue(&mut self, venue: &str) {
        let sender = self.snapshot_sender.clone();
        let venue_clone = venue.to_string();

        let listener: SnapshotListener = Arc::new(move |event: &SnapshotEvent| {
            if let Err(e) = sender.send(event.clone()) {
                error!("Failed to send snapshot event for {}: {}", venue_clone, e);
            }
        });

        let flows = VenueFlows::new(venue, &self.symbol, self.level_size, listener);
        self.flows.insert(venue.to_string(), flows);
        info!("Added flows for venue: {}", venue);
    }

    fn get_flows(&self, venue: &str) -> Option<&VenueFlows> {
        self.flows.get(venue)
    }

    fn get_flows_mut(&mut self, venue: &str) -> Option<&mut VenueFlows> {
        self.flows.get_mut(venue)
    }

    fn venues(&self) -> Vec<String> {
        self.flows.keys().cloned().collect()
    }

    fn remove_venue(&mut self, venue: &str) -> Option<VenueFlows> {
        let result = self.flows.remove(venue);
        if result.is_some() {
            info!("Removed flows for venue: {}", venue);
        }
        result
    }

    fn has_venue(&self, venue: &str) -> bool {
        self.flows.contains_key(venue)
    }

    fn venue_count(&self) -> usize {
        self.flows.len()
    }
}

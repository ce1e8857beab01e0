//! Frozen per-minute snapshots and checksummed snapshot packages.
//!
//! A snapshot is the immutable, gap-filled copy of a flow's minute matrix,
//! frozen at rollover and published as an `Arc` so readers on other threads
//! never observe a partially built value. [`SnapshotPackage`] wraps any
//! snapshot with a format version and a SHA-256 checksum for consumers that
//! ship snapshots across process boundaries.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::matrix::HeatmapGrid;
use super::tick::FlowKind;

/// Format version used for checksum-enabled snapshot packages.
pub const FLOW_SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Frozen minute of order-book resting volume per level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Unique identifier for this snapshot.
    pub snapshot_id: Uuid,
    /// Venue that produced the underlying feed.
    pub venue: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Milliseconds since epoch when the snapshot was frozen.
    pub taken_at: u64,
    /// Resting-volume heatmap; every column is gap-filled.
    pub grid: HeatmapGrid,
}

/// Frozen minute of traded volume per level, split by aggressor side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSnapshot {
    /// Unique identifier for this snapshot.
    pub snapshot_id: Uuid,
    /// Venue that produced the underlying feed.
    pub venue: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Milliseconds since epoch when the snapshot was frozen.
    pub taken_at: u64,
    /// Buy-side volume heatmap; only the price column is gap-filled.
    pub buys: HeatmapGrid,
    /// Sell-side volume heatmap; only the price column is gap-filled.
    pub sells: HeatmapGrid,
}

impl TradeSnapshot {
    /// Both sides summed into one heatmap.
    pub fn combined(&self) -> HeatmapGrid {
        self.buys.combined_with(&self.sells)
    }
}

/// Frozen minute of open-interest deltas per level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenInterestSnapshot {
    /// Unique identifier for this snapshot.
    pub snapshot_id: Uuid,
    /// Venue that produced the underlying feed.
    pub venue: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Milliseconds since epoch when the snapshot was frozen.
    pub taken_at: u64,
    /// Per-level OI delta heatmap; only the price column is gap-filled.
    pub grid: HeatmapGrid,
}

/// Frozen minute of liquidated volume per level, split by position side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationSnapshot {
    /// Unique identifier for this snapshot.
    pub snapshot_id: Uuid,
    /// Venue that produced the underlying feed.
    pub venue: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Milliseconds since epoch when the snapshot was frozen.
    pub taken_at: u64,
    /// Liquidated-longs heatmap; only the price column is gap-filled.
    pub longs: HeatmapGrid,
    /// Liquidated-shorts heatmap; only the price column is gap-filled.
    pub shorts: HeatmapGrid,
}

impl LiquidationSnapshot {
    /// Both sides summed into one heatmap.
    pub fn combined(&self) -> HeatmapGrid {
        self.longs.combined_with(&self.shorts)
    }
}

/// A published snapshot of any flow kind, shared by reference.
#[derive(Debug, Clone)]
pub enum SnapshotPayload {
    /// Order-book snapshot.
    Books(Arc<BookSnapshot>),
    /// Trade snapshot.
    Trades(Arc<TradeSnapshot>),
    /// Open-interest snapshot.
    OpenInterest(Arc<OpenInterestSnapshot>),
    /// Liquidation snapshot.
    Liquidations(Arc<LiquidationSnapshot>),
}

impl SnapshotPayload {
    /// The flow kind that produced this snapshot.
    pub fn kind(&self) -> FlowKind {
        match self {
            SnapshotPayload::Books(_) => FlowKind::Books,
            SnapshotPayload::Trades(_) => FlowKind::Trades,
            SnapshotPayload::OpenInterest(_) => FlowKind::OpenInterest,
            SnapshotPayload::Liquidations(_) => FlowKind::Liquidations,
        }
    }

    /// The venue the snapshot came from.
    pub fn venue(&self) -> &str {
        match self {
            SnapshotPayload::Books(s) => &s.venue,
            SnapshotPayload::Trades(s) => &s.venue,
            SnapshotPayload::OpenInterest(s) => &s.venue,
            SnapshotPayload::Liquidations(s) => &s.venue,
        }
    }

    /// The instrument symbol.
    pub fn symbol(&self) -> &str {
        match self {
            SnapshotPayload::Books(s) => &s.symbol,
            SnapshotPayload::Trades(s) => &s.symbol,
            SnapshotPayload::OpenInterest(s) => &s.symbol,
            SnapshotPayload::Liquidations(s) => &s.symbol,
        }
    }
}

/// Event handed to snapshot listeners when a flow publishes at rollover.
#[derive(Debug, Clone)]
pub struct SnapshotEvent {
    /// Venue the snapshot came from.
    pub venue: String,
    /// Instrument symbol.
    pub symbol: String,
    /// The published snapshot.
    pub payload: SnapshotPayload,
    /// Milliseconds since epoch at publication.
    pub published_at: u64,
}

/// Snapshot listener specification using Arc for shared ownership.
pub type SnapshotListener = Arc<dyn Fn(&SnapshotEvent) + Send + Sync>;

/// Errors raised while packaging or unpacking snapshots.
#[derive(Debug)]
#[non_exhaustive]
pub enum SnapshotError {
    /// Error while serializing snapshot data.
    SerializationError {
        /// Underlying error message.
        message: String,
    },

    /// Error while deserializing snapshot data.
    DeserializationError {
        /// Underlying error message.
        message: String,
    },

    /// Snapshot integrity check failed.
    ChecksumMismatch {
        /// Expected checksum value.
        expected: String,
        /// Actual checksum value.
        actual: String,
    },

    /// The package was produced with an unsupported format version.
    VersionMismatch {
        /// The version found in the package.
        found: u32,
        /// The version this build supports.
        expected: u32,
    },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::SerializationError { message } => {
                write!(f, "snapshot serialization error: {message}")
            }
            SnapshotError::DeserializationError { message } => {
                write!(f, "snapshot deserialization error: {message}")
            }
            SnapshotError::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "snapshot checksum mismatch: expected {expected}, but computed {actual}"
                )
            }
            SnapshotError::VersionMismatch { found, expected } => {
                write!(
                    f,
                    "unsupported snapshot version: {found} (expected {expected})"
                )
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Wrapper that provides checksum validation for serialized snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPackage<S> {
    /// Version of the snapshot schema for forward compatibility.
    pub version: u32,
    /// Snapshot payload.
    pub snapshot: S,
    /// Hex-encoded SHA-256 checksum of the serialized snapshot.
    pub checksum: String,
}

impl<S> SnapshotPackage<S>
where
    S: Serialize + DeserializeOwned,
{
    /// Creates a new package computing the checksum of the snapshot contents.
    pub fn new(snapshot: S) -> Result<Self, SnapshotError> {
        let checksum = Self::compute_checksum(&snapshot)?;
        Ok(Self {
            version: FLOW_SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    /// Serializes the package to JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|error| SnapshotError::SerializationError {
            message: error.to_string(),
        })
    }

    /// Deserializes a package from JSON.
    pub fn from_json(data: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(data).map_err(|error| SnapshotError::DeserializationError {
            message: error.to_string(),
        })
    }

    /// Validates the checksum and version.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != FLOW_SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: self.version,
                expected: FLOW_SNAPSHOT_FORMAT_VERSION,
            });
        }

        let computed = Self::compute_checksum(&self.snapshot)?;
        if computed != self.checksum {
            return Err(SnapshotError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }

        Ok(())
    }

    /// Consumes the package and returns the validated snapshot.
    pub fn into_snapshot(self) -> Result<S, SnapshotError> {
        self.validate()?;
        Ok(self.snapshot)
    }

    fn compute_checksum(snapshot: &S) -> Result<String, SnapshotError> {
        let payload =
            serde_json::to_vec(snapshot).map_err(|error| SnapshotError::SerializationError {
                message: error.to_string(),
            })?;

        let mut hasher = Sha256::new();
        hasher.update(payload);

        let checksum_bytes = hasher.finalize();
        Ok(format!("{:x}", checksum_bytes))
    }
}

#[cfg(test)]
mod tests_snapshot_package {
    use tickflow_rs::{
        FLOW_SNAPSHOT_FORMAT_VERSION, FillPolicy, Level, MinuteMatrix, SnapshotError,
        SnapshotPackage, TradeSnapshot, WriteMode,
    };
    use uuid::Uuid;

    fn sample_snapshot() -> TradeSnapshot {
        let mut buys = MinuteMatrix::new(5.0);
        buys.record_price(5, 100.0);
        buys.observe(5, Level::bucket(100.0, 5.0), 1.5, WriteMode::Accumulate);

        let mut sells = MinuteMatrix::new(5.0);
        sells.record_price(6, 101.0);
        sells.observe(6, Level::bucket(101.0, 5.0), 2.5, WriteMode::Accumulate);

        TradeSnapshot {
            snapshot_id: Uuid::new_v4(),
            venue: "alpha".to_string(),
            symbol: "BTC-PERP".to_string(),
            taken_at: 1_700_000_123_000,
            buys: buys.freeze(FillPolicy::PriceOnly),
            sells: sells.freeze(FillPolicy::PriceOnly),
        }
    }

    #[test]
    fn package_json_round_trip_restores_snapshot() {
        let snapshot = sample_snapshot();
        let snapshot_id = snapshot.snapshot_id;

        let package = SnapshotPackage::new(snapshot).expect("package");
        let json = package.to_json().expect("serialize package to json");

        let restored: SnapshotPackage<TradeSnapshot> =
            SnapshotPackage::from_json(&json).expect("parse package json");
        let restored = restored.into_snapshot().expect("validated snapshot");

        assert_eq!(restored.snapshot_id, snapshot_id);
        assert_eq!(restored.venue, "alpha");
        assert_eq!(restored.buys.cell(5, Level::bucket(100.0, 5.0)), 1.5);
        assert_eq!(restored.sells.cell(6, Level::bucket(101.0, 5.0)), 2.5);
        // The filled price column survives the round trip
        assert_eq!(restored.buys.price[59], 100.0);
    }

    #[test]
    fn validate_rejects_checksum_mismatch() {
        let mut package = SnapshotPackage::new(sample_snapshot()).expect("package");
        package.checksum = "deadbeef".to_string();

        let err = package
            .validate()
            .expect_err("checksum mismatch should be detected");
        assert!(matches!(err, SnapshotError::ChecksumMismatch { .. }));
    }

    #[test]
    fn validate_rejects_version_mismatch() {
        let mut package = SnapshotPackage::new(sample_snapshot()).expect("package");
        package.version = FLOW_SNAPSHOT_FORMAT_VERSION + 1;

        let err = package
            .into_snapshot()
            .expect_err("version mismatch should be rejected");
        assert!(matches!(err, SnapshotError::VersionMismatch { .. }));
    }

    #[test]
    fn tampered_payload_fails_validation() {
        let package = SnapshotPackage::new(sample_snapshot()).expect("package");
        let json = package.to_json().expect("serialize package to json");

        let tampered = json.replace("\"alpha\"", "\"omega\"");
        let parsed: SnapshotPackage<TradeSnapshot> =
            SnapshotPackage::from_json(&tampered).expect("parse tampered json");

        let err = parsed
            .validate()
            .expect_err("payload tampering should be detected");
        assert!(matches!(err, SnapshotError::ChecksumMismatch { .. }));
    }

    #[test]
    fn malformed_json_reports_deserialization_error() {
        let err = SnapshotPackage::<TradeSnapshot>::from_json("{not json")
            .expect_err("malformed input");
        assert!(matches!(err, SnapshotError::DeserializationError { .. }));
    }
}

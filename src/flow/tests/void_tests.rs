//! Tests for void (canceled liquidity) inference.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use crate::flow::level::Level;
    use crate::flow::matrix::{FillPolicy, HeatmapGrid, MinuteMatrix, SLOTS, WriteMode};
    use crate::flow::merge::MergeEngine;
    use crate::flow::snapshot::{BookSnapshot, TradeSnapshot};
    use crate::flow::voids::infer_voids;

    fn constant_grid(level_size: f64, index: i64, amount: f64, price: f64) -> HeatmapGrid {
        let mut matrix = MinuteMatrix::new(level_size);
        for slot in 0..SLOTS {
            matrix.observe(slot as u8, Level::from_index(index), amount, WriteMode::Overwrite);
            matrix.record_price(slot as u8, price);
        }
        matrix.freeze(FillPolicy::All)
    }

    fn empty_grid(level_size: f64) -> HeatmapGrid {
        MinuteMatrix::new(level_size).freeze(FillPolicy::PriceOnly)
    }

    fn book_snapshot(grid: HeatmapGrid) -> Arc<BookSnapshot> {
        Arc::new(BookSnapshot {
            snapshot_id: Uuid::new_v4(),
            venue: "alpha".to_string(),
            symbol: "BTC-PERP".to_string(),
            taken_at: 0,
            grid,
        })
    }

    fn trade_snapshot(buys: HeatmapGrid, sells: HeatmapGrid) -> Arc<TradeSnapshot> {
        Arc::new(TradeSnapshot {
            snapshot_id: Uuid::new_v4(),
            venue: "alpha".to_string(),
            symbol: "BTC-PERP".to_string(),
            taken_at: 0,
            buys,
            sells,
        })
    }

    #[test]
    fn constant_net_series_voids_only_at_the_tail() {
        let mut engine = MergeEngine::new("BTC-PERP");

        let books = engine
            .merge_books(&[book_snapshot(constant_grid(5.0, 20, 5.0, 100.0))])
            .expect("merge succeeds");
        let trades = engine
            .merge_trades(&[trade_snapshot(empty_grid(5.0), empty_grid(5.0))])
            .expect("merge succeeds");

        let void = infer_voids(&books, &trades);

        // net is constant 5 everywhere, so every forward difference is zero
        // and only the raw tail row contributes
        assert_eq!(void.void_volume.get(&Level::from_index(20)), Some(&5.0));
        assert_eq!(void.total_void_volume, 5.0);
    }

    #[test]
    fn trades_offset_book_reductions() {
        let mut engine = MergeEngine::new("BTC-PERP");
        let level = Level::from_index(20);

        // Book loses 4 units between seconds 0 and 1, flat afterwards
        let mut book_matrix = MinuteMatrix::new(5.0);
        for slot in 0..SLOTS {
            let amount = if slot == 0 { 10.0 } else { 6.0 };
            book_matrix.observe(slot as u8, level, amount, WriteMode::Overwrite);
            book_matrix.record_price(slot as u8, 100.0);
        }
        let books = engine
            .merge_books(&[book_snapshot(book_matrix.freeze(FillPolicy::All))])
            .expect("merge succeeds");

        // One unit traded at second 1 explains part of the disappearance
        let mut buy_matrix = MinuteMatrix::new(5.0);
        buy_matrix.observe(1, level, 1.0, WriteMode::Overwrite);
        buy_matrix.record_price(1, 100.0);
        let trades = engine
            .merge_trades(&[trade_snapshot(
                buy_matrix.freeze(FillPolicy::PriceOnly),
                empty_grid(5.0),
            )])
            .expect("merge succeeds");

        let void = infer_voids(&books, &trades);

        // net: [10, 5, 6, 6, ...]; differenced rows: [-5, +1, 0, ..., 0],
        // tail row raw 6 → sum = 2
        let volume = void.void_volume.get(&level).expect("level present");
        assert!((volume - 2.0).abs() < 1e-9);
        assert!(void.void_variance.get(&level).expect("variance present") > &0.0);
    }

    #[test]
    fn price_is_the_trades_last_second() {
        let mut engine = MergeEngine::new("BTC-PERP");

        let books = engine
            .merge_books(&[book_snapshot(constant_grid(5.0, 20, 5.0, 100.0))])
            .expect("merge succeeds");
        let trades = engine
            .merge_trades(&[trade_snapshot(
                constant_grid(5.0, 20, 1.0, 102.5),
                empty_grid(5.0),
            )])
            .expect("merge succeeds");

        let void = infer_voids(&books, &trades);
        assert_eq!(void.price, 102.5);
        assert_eq!(void.symbol, "BTC-PERP");
    }

    #[test]
    fn empty_minute_yields_all_zero_voids() {
        let mut engine = MergeEngine::new("BTC-PERP");

        let books = engine
            .merge_books(&[book_snapshot(empty_grid(5.0))])
            .expect("merge succeeds");
        let trades = engine
            .merge_trades(&[trade_snapshot(empty_grid(5.0), empty_grid(5.0))])
            .expect("merge succeeds");

        let void = infer_voids(&books, &trades);
        assert_eq!(void.total_void_volume, 0.0);
        assert_eq!(void.price, 0.0);
        assert!(void.void_volume.is_empty());
    }
}

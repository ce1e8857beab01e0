#[cfg(test)]
mod tests_properties {
    use proptest::prelude::*;
    use std::sync::Arc;
    use uuid::Uuid;

    use tickflow_rs::{
        BookSnapshot, FillPolicy, HeatmapGrid, Level, MergeEngine, MinuteMatrix, WriteMode,
    };

    fn arb_grid() -> impl Strategy<Value = HeatmapGrid> {
        (
            proptest::collection::vec((0u8..60, 1i64..40, 0.1f64..1_000.0), 0..30),
            proptest::collection::vec((0u8..60, 1.0f64..1_000.0), 0..10),
        )
            .prop_map(|(cells, prices)| {
                let mut matrix = MinuteMatrix::new(5.0);
                for (slot, index, amount) in cells {
                    matrix.observe(slot, Level::from_index(index), amount, WriteMode::Accumulate);
                }
                for (slot, price) in prices {
                    matrix.record_price(slot, price);
                }
                matrix.freeze(FillPolicy::PriceOnly)
            })
    }

    fn snapshot(venue: &str, grid: HeatmapGrid) -> Arc<BookSnapshot> {
        Arc::new(BookSnapshot {
            snapshot_id: Uuid::new_v4(),
            venue: venue.to_string(),
            symbol: "BTC-PERP".to_string(),
            taken_at: 0,
            grid,
        })
    }

    proptest! {
        #[test]
        fn bucketing_respects_level_bounds(
            price in 0.01f64..1_000_000.0,
            level_size in 0.1f64..500.0,
        ) {
            let level = Level::bucket(price, level_size);
            let level_price = level.price(level_size);

            // The level is the bucket's upper bound...
            prop_assert!(level_price >= price - 1e-6 * price.abs().max(1.0));
            // ...no more than one bucket width above the price...
            prop_assert!(level_price - price < level_size + 1e-6 * level_size);
            // ...and an exact multiple of the bucket width by construction.
            prop_assert_eq!(level_price, level.index() as f64 * level_size);
        }

        #[test]
        fn merge_is_commutative_on_cells(a in arb_grid(), b in arb_grid()) {
            let mut engine = MergeEngine::new("BTC-PERP");

            let ab = engine
                .merge_books(&[snapshot("alpha", a.clone()), snapshot("beta", b.clone())])
                .expect("merge succeeds");
            let ba = engine
                .merge_books(&[snapshot("beta", b), snapshot("alpha", a)])
                .expect("merge succeeds");

            prop_assert_eq!(&ab.grid.columns, &ba.grid.columns);
        }

        #[test]
        fn merging_one_snapshot_is_identity(a in arb_grid()) {
            let mut engine = MergeEngine::new("BTC-PERP");

            let merged = engine
                .merge_books(&[snapshot("alpha", a.clone())])
                .expect("merge succeeds");

            prop_assert_eq!(&merged.grid.columns, &a.columns);
            prop_assert_eq!(&merged.grid.price, &a.price);
        }

        #[test]
        fn filled_price_column_has_no_gaps(grid in arb_grid()) {
            // Once any price was observed, every slot is non-zero after fill
            if grid.has_price() {
                prop_assert!(grid.price.iter().all(|&p| p != 0.0));
            }
        }

        #[test]
        fn fill_preserves_observed_cells(
            slot in 0u8..60,
            price in 1.0f64..1_000.0,
        ) {
            let mut matrix = MinuteMatrix::new(5.0);
            matrix.record_price(slot, price);

            let grid = matrix.freeze(FillPolicy::PriceOnly);
            prop_assert_eq!(grid.price[slot as usize], price);
            // A single observation propagates everywhere
            prop_assert!(grid.price.iter().all(|&p| p == price));
        }
    }
}

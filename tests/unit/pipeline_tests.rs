#[cfg(test)]
mod tests_pipeline {
    use tickflow_rs::prelude::*;

    /// Minute boundary base so `at(m, s)` lands on second-of-minute `s`.
    const BASE: i64 = 1_700_000_040;

    fn at(minute: i64, second: i64) -> i64 {
        BASE + minute * 60 + second
    }

    /// Feed one full minute of activity for every flow kind. The next
    /// minute's first tick (second 3 after second 50) triggers rollover.
    fn feed_minute(manager: &mut FlowManagerStd, venue: &str, minute: i64) {
        let flows = manager.get_flows_mut(venue).expect("registered venue");

        let depth = BookUpdate {
            timestamp: at(minute, 3),
            bids: vec![(99.0, 4.0), (100.0, 6.0)],
            asks: vec![(101.0, 5.0)],
        };
        flows.books.update(&depth).expect("valid book update");
        flows
            .books
            .update(&BookUpdate {
                timestamp: at(minute, 50),
                ..depth.clone()
            })
            .expect("valid book update");

        flows
            .trades
            .update(&TradeTick {
                timestamp: at(minute, 10),
                side: Side::Buy,
                price: 100.0,
                amount: 1.0,
            })
            .expect("valid trade");
        flows
            .trades
            .update(&TradeTick {
                timestamp: at(minute, 40),
                side: Side::Sell,
                price: 101.0,
                amount: 2.0,
            })
            .expect("valid trade");

        flows
            .open_interest
            .update(&OpenInterestTick {
                timestamp: at(minute, 20),
                price: 100.0,
                open_interest: 1_000.0 + minute as f64 * 50.0,
            })
            .expect("valid reading");
        flows
            .open_interest
            .update(&OpenInterestTick {
                timestamp: at(minute, 50),
                price: 100.0,
                open_interest: 1_010.0 + minute as f64 * 50.0,
            })
            .expect("valid reading");

        flows
            .liquidations
            .update(&LiquidationTick {
                timestamp: at(minute, 30),
                side: Side::Sell,
                price: 99.5,
                amount: 0.25,
            })
            .expect("valid liquidation");
        flows
            .liquidations
            .update(&LiquidationTick {
                timestamp: at(minute, 45),
                side: Side::Buy,
                price: 100.0,
                amount: 0.125,
            })
            .expect("valid liquidation");
    }

    #[test]
    fn two_venues_two_minutes_end_to_end() {
        let mut manager = FlowManagerStd::new("BTC-PERP", 5.0);
        manager.add_venue("alpha");
        manager.add_venue("beta");

        // Minute 0 accumulates, minute 1 triggers every flow's rollover
        for minute in 0..2 {
            feed_minute(&mut manager, "alpha", minute);
            feed_minute(&mut manager, "beta", minute);
        }
        manager.drain_pending();

        // 2 venues × 4 kinds published
        assert_eq!(manager.board().len(), 8);

        let books = manager.merged_books().expect("books merged");
        assert_eq!(books.venues.len(), 2);
        // Resting volume sums across venues: (4 + 6) per venue at level 100
        let level = Level::bucket(100.0, 5.0);
        assert_eq!(books.grid.cell(3, level), 20.0);
        // Book columns are filled through the quiet seconds too
        assert_eq!(books.grid.cell(25, level), 20.0);
        let ohlc = books.stats.ohlc.expect("OHLC derived");
        assert_eq!(ohlc.open, 100.5);
        assert_eq!(ohlc.close, 100.5);

        let trades = manager.merged_trades().expect("trades merged");
        assert_eq!(trades.stats.total_volume, 6.0);
        assert_eq!(trades.buys.cell(10, Level::bucket(100.0, 5.0)), 2.0);
        assert_eq!(trades.sells.cell(40, Level::bucket(101.0, 5.0)), 4.0);
        // No fill on event columns: the quiet second stays zero
        assert_eq!(trades.buys.cell(11, Level::bucket(100.0, 5.0)), 0.0);

        let oi = manager.merged_open_interest().expect("OI merged");
        // Each venue's minute 0: first reading seeds (zero delta), the
        // second adds +10
        assert_eq!(oi.stats.net_change, 20.0);

        let liquidations = manager.merged_liquidations().expect("liquidations merged");
        assert_eq!(liquidations.stats.total_volume, 0.75);
        assert_eq!(liquidations.shorts.cell(30, Level::bucket(99.5, 5.0)), 0.5);
        assert_eq!(liquidations.longs.cell(45, Level::bucket(100.0, 5.0)), 0.25);
        assert_eq!(liquidations.longs.cell(30, Level::bucket(99.5, 5.0)), 0.0);

        let void = manager.void_snapshot().expect("void inferred");
        assert_eq!(void.symbol, "BTC-PERP");
        assert_eq!(void.level_size, 5.0);
        // Trades merged price, gap-filled through second 59
        assert_eq!(void.price, 100.0);
    }

    #[test]
    fn second_minute_of_readings_carries_oi_deltas() {
        let mut manager = FlowManagerStd::new("BTC-PERP", 5.0);
        manager.add_venue("alpha");

        for minute in 0..3 {
            feed_minute(&mut manager, "alpha", minute);
        }
        manager.drain_pending();

        let oi = manager.merged_open_interest().expect("OI merged");
        // The latest snapshot covers minute 1: +40 against minute 0's last
        // reading, then +10 within the minute
        assert_eq!(oi.stats.net_change, 50.0);
    }

    #[test]
    fn flows_expose_snapshots_only_after_rollover() {
        let mut manager = FlowManagerStd::new("BTC-PERP", 5.0);
        manager.add_venue("alpha");

        feed_minute(&mut manager, "alpha", 0);
        manager.drain_pending();

        let flows = manager.get_flows("alpha").expect("registered venue");
        assert!(flows.books.snapshot().is_none());
        assert!(flows.trades.snapshot().is_none());
        assert!(flows.open_interest.snapshot().is_none());
        assert!(flows.liquidations.snapshot().is_none());
        assert!(manager.board().is_empty());
        assert!(manager.merged_trades().is_none());

        feed_minute(&mut manager, "alpha", 1);
        manager.drain_pending();

        let flows = manager.get_flows("alpha").expect("registered venue");
        assert!(flows.books.snapshot().is_some());
        assert!(flows.trades.snapshot().is_some());
        assert!(flows.open_interest.snapshot().is_some());
        assert!(flows.liquidations.snapshot().is_some());
    }

    #[test]
    fn standalone_flows_work_without_a_manager() {
        let mut flow = TradeFlow::new("alpha", "ETH-PERP", 2.0);

        flow.update(&TradeTick {
            timestamp: at(0, 59),
            side: Side::Buy,
            price: 2_000.5,
            amount: 1.0,
        })
        .expect("valid trade");
        flow.update(&TradeTick {
            timestamp: at(1, 0),
            side: Side::Buy,
            price: 2_001.0,
            amount: 1.0,
        })
        .expect("valid trade");

        let snapshot = flow.snapshot().expect("published at rollover");
        assert_eq!(snapshot.venue, "alpha");
        assert_eq!(snapshot.symbol, "ETH-PERP");
        assert_eq!(snapshot.buys.cell(59, Level::bucket(2_000.5, 2.0)), 1.0);
    }
}

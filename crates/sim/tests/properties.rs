use std::sync::Arc;

use proptest::prelude::*;
use sim::{FaultCatalog, FaultInjector, OperatingRanges, Sensor, StateGenerator};

fn injector() -> FaultInjector {
    FaultInjector::new(Arc::new(FaultCatalog::default()))
}

proptest! {
    /// Every baseline reading lies inside its declared operating range.
    #[test]
    fn normal_snapshots_stay_in_range(seed in any::<u64>()) {
        let ranges = Arc::new(OperatingRanges::default());
        let mut g = StateGenerator::seeded(Arc::clone(&ranges), seed);
        let s = g.generate_normal();
        for sensor in Sensor::ALL {
            prop_assert!(ranges.get(sensor).contains(s.value(sensor)), "{sensor} = {}", s.value(sensor));
        }
        prop_assert!(s.alarms.is_empty());
    }

    /// High discharge temperature always pins discharge temp and fan duty.
    #[test]
    fn high_discharge_temp_is_input_independent(seed in any::<u64>(), base_fan in 0u8..=100, base_temp in -50.0f64..500.0) {
        let mut g = StateGenerator::seeded(Arc::new(OperatingRanges::default()), seed);
        let mut s = g.generate_normal();
        s.condenser_fan_speed = base_fan;
        s.discharge_temp_f = base_temp;

        let out = injector().inject(&s, "high_discharge_temp").unwrap();
        prop_assert_eq!(out.discharge_temp_f, 250.0);
        prop_assert_eq!(out.condenser_fan_speed, 30);
        prop_assert!(out.has_alarm("high_discharge_temp"));
    }

    /// Injection never changes the snapshot it was given.
    #[test]
    fn inject_leaves_input_untouched(seed in any::<u64>(), which in 0usize..3) {
        let mut g = StateGenerator::seeded(Arc::new(OperatingRanges::default()), seed);
        let s = g.generate_normal();
        let before = s.clone();
        let injector = injector();
        let name = injector.catalog().names().nth(which).unwrap().to_string();

        let _ = injector.inject(&s, &name).unwrap();
        prop_assert_eq!(s, before);
    }
}

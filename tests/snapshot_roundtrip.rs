//! Snapshot round-trip integration tests.
//!
//! Verifies that partitions and modifications can be captured as snapshots,
//! serialised to JSON, deserialised back, and restored through the validating
//! factories with every value preserved.

#[cfg(feature = "serde")]
mod tests {
    use simplex_edit::snapshot::{
        ModificationFlavour, ModificationSnapshot, PartitionSnapshot, SNAPSHOT_VERSION,
    };
    use simplex_edit::{
        DetailedPartitionModification, ErrorKind, HashMap, Partition, PartitionModification,
        SimplePartitionModification, UnitFraction,
    };

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn entries(pairs: &[(&str, f64)]) -> HashMap<String, UnitFraction> {
        pairs
            .iter()
            .map(|&(k, v)| (k.to_string(), UnitFraction::new(v).unwrap()))
            .collect()
    }

    fn portfolio() -> Partition<String> {
        let weights: HashMap<String, f64> = [("bonds", 3.0), ("equity", 5.0), ("cash", 2.0)]
            .into_iter()
            .map(|(k, w)| (k.to_string(), w))
            .collect();
        Partition::from_weights(weights).unwrap()
    }

    fn rebalance() -> DetailedPartitionModification<String> {
        DetailedPartitionModification::builder()
            .keys_to_add(entries(&[("gold", 0.2)]))
            .keys_to_increase(entries(&[("bonds", 0.1)]))
            .keys_to_remove(entries(&[("cash", 0.2)]))
            .keys_to_decrease(entries(&[("equity", 0.1)]))
            .removal_epsilon(1e-9)
            .build()
            .unwrap()
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_partition_json_round_trip() {
        let p = portfolio();
        let snapshot = PartitionSnapshot::from_partition(&p);
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);

        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: PartitionSnapshot<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);

        let restored = decoded.restore().unwrap();
        assert_eq!(restored, p, "restored partition should equal the original");
    }

    #[test]
    fn test_partition_json_is_deterministic() {
        let a = serde_json::to_string(&PartitionSnapshot::from_partition(&portfolio())).unwrap();
        let b = serde_json::to_string(&PartitionSnapshot::from_partition(&portfolio())).unwrap();
        assert_eq!(a, b);
        // Heaviest first.
        let equity = a.find("equity").unwrap();
        let bonds = a.find("bonds").unwrap();
        assert!(equity < bonds, "json={}", a);
    }

    #[test]
    fn test_tampered_partition_is_rejected() {
        let mut snapshot = PartitionSnapshot::from_partition(&portfolio());
        snapshot.entries[0].fraction += 0.1;
        let err = snapshot.restore().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);

        let mut snapshot = PartitionSnapshot::from_partition(&portfolio());
        snapshot.entries[0].fraction = 1.5;
        let err = snapshot.restore().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_detailed_modification_round_trip_then_apply() {
        let m = rebalance();
        let snapshot = ModificationSnapshot::from_detailed(&m);
        assert_eq!(snapshot.flavour, ModificationFlavour::Detailed);
        assert_eq!(snapshot.categories.len(), 4);

        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: ModificationSnapshot<String> = serde_json::from_str(&json).unwrap();
        let restored = decoded.restore_detailed().unwrap();
        assert_eq!(restored, m);
        assert_eq!(restored.tolerances().removal_epsilon, Some(1e-9));

        let result = restored.apply_to(&portfolio()).unwrap();
        assert!((result.get_or_zero(&"gold".to_string()).value() - 0.2).abs() < 1e-12);
        assert!((result.get_or_zero(&"bonds".to_string()).value() - 0.4).abs() < 1e-12);
        assert!((result.get_or_zero(&"equity".to_string()).value() - 0.4).abs() < 1e-12);
        assert!(!result.contains_key(&"cash".to_string()));
    }

    #[test]
    fn test_simple_modification_round_trip() {
        let m = SimplePartitionModification::new(
            entries(&[("gold", 0.05)]),
            entries(&[("equity", 0.05)]),
        )
        .unwrap();
        let json = serde_json::to_string(&ModificationSnapshot::from_simple(&m)).unwrap();
        let decoded: ModificationSnapshot<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.restore_simple().unwrap(), m);
    }

    #[test]
    fn test_unbalanced_snapshot_is_rejected_on_restore() {
        let mut snapshot = ModificationSnapshot::from_detailed(&rebalance());
        snapshot.categories[0].entries[0].fraction = 0.3;
        let err = snapshot.restore_detailed().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Balance);
    }

    #[test]
    fn test_missing_category_is_rejected_on_restore() {
        let mut snapshot = ModificationSnapshot::from_detailed(&rebalance());
        snapshot.categories.pop();
        let err = snapshot.restore_detailed().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}

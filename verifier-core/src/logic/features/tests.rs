//! Integration Tests for Feature Extraction
//!
//! Manifest text in, feature table out.

#[cfg(test)]
mod integration_tests {
    use crate::logic::features::{FeatureError, FeatureExtractor, FeatureRow, FeatureTable, NetworkFunction};
    use crate::logic::locator::parse_manifest;

    fn extract(yaml: &str) -> Result<FeatureTable, FeatureError> {
        let manifest = parse_manifest(yaml).unwrap();
        FeatureExtractor::new().extract(&manifest)
    }

    fn invalid_field(yaml: &str) -> String {
        match extract(yaml).unwrap_err() {
            FeatureError::InvalidField { field, .. } => field,
        }
    }

    #[test]
    fn test_no_known_components_gives_zero_rows() {
        let table = extract("upf:\n  replicaCount: 4\nglobal:\n  image: nf:1.0\n").unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table, FeatureTable::empty());
        let order: Vec<_> = table.iter().map(|r| r.network_function).collect();
        assert_eq!(order, vec![NetworkFunction::Amf, NetworkFunction::Smf, NetworkFunction::Pcf]);
    }

    #[test]
    fn test_empty_manifest() {
        assert_eq!(extract("").unwrap(), FeatureTable::empty());
    }

    #[test]
    fn test_replicas_only() {
        let table = extract("smf:\n  replicaCount: 3\n").unwrap();

        assert_eq!(
            *table.get(NetworkFunction::Smf),
            FeatureRow {
                replica_count: 3,
                cpu_limit: 0.0,
                memory_limit: 0,
                network_function: NetworkFunction::Smf,
            }
        );
        assert_eq!(*table.get(NetworkFunction::Amf), FeatureRow::empty(NetworkFunction::Amf));
    }

    #[test]
    fn test_full_amf_block() {
        let yaml = r#"
amf:
  replicaCount: 3
  resources:
    limits:
      cpu: "200m"
      memory: "256Mi"
"#;
        let table = extract(yaml).unwrap();

        assert_eq!(
            table.rows()[0],
            FeatureRow {
                replica_count: 3,
                cpu_limit: 0.2,
                memory_limit: 268435456,
                network_function: NetworkFunction::Amf,
            }
        );
        assert_eq!(table.rows()[1], FeatureRow::empty(NetworkFunction::Smf));
        assert_eq!(table.rows()[2], FeatureRow::empty(NetworkFunction::Pcf));
    }

    #[test]
    fn test_plain_numbers() {
        let yaml = "pcf:\n  replicaCount: 2\n  resources:\n    limits:\n      cpu: 2\n      memory: 1073741824\n";
        let row = extract(yaml).unwrap().get(NetworkFunction::Pcf).clone();

        assert_eq!(row.cpu_limit, 2.0);
        assert_eq!(row.memory_limit, 1073741824);
    }

    #[test]
    fn test_unquoted_suffixes_and_floats() {
        let yaml = "amf:\n  resources:\n    limits:\n      cpu: 1.5\n      memory: 1Gi\nsmf:\n  resources:\n    limits:\n      cpu: 500m\n      memory: 1G\n";
        let table = extract(yaml).unwrap();

        assert_eq!(table.get(NetworkFunction::Amf).cpu_limit, 1.5);
        assert_eq!(table.get(NetworkFunction::Amf).memory_limit, 1073741824);
        assert_eq!(table.get(NetworkFunction::Smf).cpu_limit, 0.5);
        assert_eq!(table.get(NetworkFunction::Smf).memory_limit, 1_000_000_000);
    }

    #[test]
    fn test_requests_are_ignored() {
        let yaml = "amf:\n  resources:\n    requests:\n      cpu: 100m\n      memory: 64Mi\n";
        assert_eq!(*extract(yaml).unwrap().get(NetworkFunction::Amf), FeatureRow::empty(NetworkFunction::Amf));
    }

    #[test]
    fn test_nulls_take_defaults() {
        let yaml = "amf: ~\nsmf:\n  replicaCount: ~\n  resources: ~\npcf:\n  resources:\n    limits:\n      cpu: ~\n      memory: 128Mi\n";
        let table = extract(yaml).unwrap();

        assert_eq!(*table.get(NetworkFunction::Amf), FeatureRow::empty(NetworkFunction::Amf));
        assert_eq!(*table.get(NetworkFunction::Smf), FeatureRow::empty(NetworkFunction::Smf));
        assert_eq!(table.get(NetworkFunction::Pcf).cpu_limit, 0.0);
        assert_eq!(table.get(NetworkFunction::Pcf).memory_limit, 134217728);
    }

    #[test]
    fn test_string_replica_count() {
        let table = extract("amf:\n  replicaCount: \"5\"\n").unwrap();
        assert_eq!(table.get(NetworkFunction::Amf).replica_count, 5);
    }

    #[test]
    fn test_unparseable_cpu_names_field() {
        let err = extract("smf:\n  resources:\n    limits:\n      cpu: lots\n").unwrap_err();

        assert_eq!(err.field(), "smf.resources.limits.cpu");
        assert!(err.to_string().contains("lots"));
        assert!(matches!(
            err,
            FeatureError::InvalidField { network_function: NetworkFunction::Smf, .. }
        ));
    }

    #[test]
    fn test_invalid_memory_names_field() {
        assert_eq!(
            invalid_field("pcf:\n  resources:\n    limits:\n      memory: 12 GB\n"),
            "pcf.resources.limits.memory"
        );
        assert_eq!(
            invalid_field("pcf:\n  resources:\n    limits:\n      memory: -1Gi\n"),
            "pcf.resources.limits.memory"
        );
    }

    #[test]
    fn test_invalid_replicas() {
        for yaml in [
            "amf:\n  replicaCount: -1\n",
            "amf:\n  replicaCount: 2.5\n",
            "amf:\n  replicaCount: true\n",
            "amf:\n  replicaCount: three\n",
            "amf:\n  replicaCount: 99999999999\n",
        ] {
            assert_eq!(invalid_field(yaml), "amf.replicaCount", "{}", yaml);
        }
    }

    #[test]
    fn test_integral_float_replicas_accepted() {
        let table = extract("amf:\n  replicaCount: 3.0\n").unwrap();
        assert_eq!(table.get(NetworkFunction::Amf).replica_count, 3);
    }

    #[test]
    fn test_non_mapping_blocks() {
        assert_eq!(invalid_field("amf: enabled\n"), "amf");
        assert_eq!(invalid_field("smf:\n  resources: big\n"), "smf.resources");
        assert_eq!(invalid_field("pcf:\n  resources:\n    limits: [1, 2]\n"), "pcf.resources.limits");
        assert_eq!(
            invalid_field("amf:\n  resources:\n    limits:\n      cpu: [1]\n"),
            "amf.resources.limits.cpu"
        );
    }

    #[test]
    fn test_first_error_wins_in_row_order() {
        let yaml = "pcf:\n  replicaCount: x\namf:\n  replicaCount: y\n";
        assert_eq!(invalid_field(yaml), "amf.replicaCount");
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let yaml = "amf:\n  replicaCount: 3\n  resources:\n    limits:\n      cpu: 250m\n      memory: 300Mi\n";
        let a = serde_json::to_string(extract(yaml).unwrap().rows()).unwrap();
        let b = serde_json::to_string(extract(yaml).unwrap().rows()).unwrap();
        assert_eq!(a, b);
    }
}

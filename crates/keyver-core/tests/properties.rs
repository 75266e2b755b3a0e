//! Property tests for versions and the registry

use keyver_core::{ApiVersion, RegistryError, VersionRegistry};
use proptest::prelude::*;
use std::cmp::Ordering;

fn version() -> impl Strategy<Value = ApiVersion> {
    (0u32..1000, 0u32..1000).prop_map(|(major, minor)| ApiVersion::new(major, minor))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Formatting then parsing yields the same version
    #[test]
    fn prop_format_parse_identity(major in any::<u32>(), minor in any::<u32>()) {
        let version = ApiVersion::new(major, minor);
        let text = version.to_string();

        prop_assert_eq!(text.parse::<ApiVersion>().unwrap(), version);
        prop_assert_eq!(text, format!("{}.{}", major, minor));
    }

    /// Ordering is antisymmetric and agrees with (major, minor) tuples
    #[test]
    fn prop_total_order(a in version(), b in version()) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a.cmp(&b), (a.major, a.minor).cmp(&(b.major, b.minor)));
        prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
    }

    /// Ordering is transitive
    #[test]
    fn prop_transitive(a in version(), b in version(), c in version()) {
        if a <= b && b <= c {
            prop_assert!(a <= c);
        }
    }

    /// Text with leading zeros or extra components never parses
    #[test]
    fn prop_non_canonical_rejected(major in 0u32..100, minor in 0u32..100, patch in 0u32..100) {
        let padded = format!("0{}.{}", major, minor);
        let three_part = format!("{}.{}.{}", major, minor, patch);
        let prefixed = format!("v{}.{}", major, minor);

        prop_assert!(padded.parse::<ApiVersion>().is_err());
        prop_assert!(three_part.parse::<ApiVersion>().is_err());
        prop_assert!(prefixed.parse::<ApiVersion>().is_err());
    }

    /// describe_all is strictly descending whatever the registration order
    #[test]
    fn prop_registry_newest_first(versions in prop::collection::btree_set(version(), 1..20)) {
        let mut shuffled: Vec<ApiVersion> = versions.iter().copied().collect();
        shuffled.reverse();
        let mid = shuffled.len() / 2;
        shuffled.rotate_left(mid);

        let mut registry = VersionRegistry::new();
        for v in &shuffled {
            registry.supported(*v).unwrap();
        }

        let described: Vec<ApiVersion> = registry.describe_all().iter().map(|r| r.version).collect();
        prop_assert_eq!(described.len(), versions.len());
        prop_assert!(described.windows(2).all(|w| w[0] > w[1]));
    }

    /// Registering a version twice always fails and leaves the registry unchanged
    #[test]
    fn prop_duplicate_rejected(v in version(), deprecated in any::<bool>()) {
        let mut registry = VersionRegistry::new();
        registry.register(v, deprecated, None).unwrap();

        prop_assert_eq!(
            registry.register(v, !deprecated, None),
            Err(RegistryError::DuplicateVersion(v))
        );
        prop_assert_eq!(registry.is_deprecated(&v), deprecated);
    }
}

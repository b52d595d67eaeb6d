use super::*;
use chrono::NaiveDate;

#[test]
fn test_version_accepts_timestamp() {
    let v = MigrationVersion::new("20230101000000").unwrap();
    assert_eq!(v.as_str(), "20230101000000");
    assert!(!v.is_zero());
}

#[test]
fn test_version_accepts_zero_sentinel() {
    let v = MigrationVersion::new("0").unwrap();
    assert!(v.is_zero());
    assert_eq!(v, MigrationVersion::zero());
}

#[test]
fn test_version_rejects_malformed() {
    for bad in ["", "2023", "2023010100000a", "202301010000001", "00"] {
        assert!(
            matches!(
                MigrationVersion::new(bad),
                Err(CoreError::InvalidVersion { .. })
            ),
            "expected '{bad}' to be rejected"
        );
    }
}

#[test]
fn test_version_ordering_is_chronological() {
    let zero = MigrationVersion::zero();
    let a = MigrationVersion::new("20230101000000").unwrap();
    let b = MigrationVersion::new("20230102000000").unwrap();
    let c = MigrationVersion::new("20231231235959").unwrap();
    assert!(zero < a);
    assert!(a < b);
    assert!(b < c);
}

#[test]
fn test_version_formatted() {
    let v = MigrationVersion::new("20230102153045").unwrap();
    assert_eq!(v.formatted(), "2023-01-02 15:30:45");
    assert_eq!(MigrationVersion::zero().formatted(), "0");
}

#[test]
fn test_version_from_datetime() {
    let at = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(7, 5, 1)
        .unwrap();
    assert_eq!(MigrationVersion::from_datetime(at), "20240309070501");
}

#[test]
fn test_version_deserialize_from_yaml_integer() {
    let v: MigrationVersion = serde_yaml::from_str("20230101000000").unwrap();
    assert_eq!(v, "20230101000000");
    let v: MigrationVersion = serde_yaml::from_str("'20230101000000'").unwrap();
    assert_eq!(v, "20230101000000");
    assert!(serde_yaml::from_str::<MigrationVersion>("'abc'").is_err());
}

#[test]
fn test_version_borrow_lookup() {
    use std::collections::BTreeMap;
    let mut map = BTreeMap::new();
    map.insert(MigrationVersion::new("20230101000000").unwrap(), 1);
    assert_eq!(map.get("20230101000000"), Some(&1));
}

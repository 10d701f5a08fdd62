//! Cluster version ordering and upgrade assessment
//!
//! Versions are dot-separated non-negative integers compared component-wise,
//! so `1.30` sorts above `1.9`. Tuples of different length use tuple order:
//! a strictly shorter prefix-equal version is the smaller one. Spellings
//! that parse to the same numbers (`1.30`, `01.30`) stay distinct and are
//! ordered by their text, but neither is newer than the other.

use crate::error::{FleetError, FleetResult};
use crate::models::AddonCompatibility;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A parsed orchestration-engine version
#[derive(Debug, Clone)]
pub struct ClusterVersion {
    raw: String,
    parts: Vec<u64>,
}

impl ClusterVersion {
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ClusterVersion {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let parts = raw
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| FleetError::InvalidState(format!("unparseable version '{}'", s)))?;

        Ok(Self {
            raw: raw.to_string(),
            parts,
        })
    }
}

impl PartialEq for ClusterVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ClusterVersion {}

impl PartialOrd for ClusterVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClusterVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts
            .cmp(&other.parts)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for ClusterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ClusterVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Ordered set of known versions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSet(BTreeSet<ClusterVersion>);

impl VersionSet {
    /// Build from raw strings, skipping any that do not parse
    pub fn from_strings<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            versions
                .into_iter()
                .filter_map(|v| v.as_ref().parse().ok())
                .collect(),
        )
    }

    /// Every cluster version any add-on release is compatible with
    pub fn from_compatibilities(compatibilities: &[AddonCompatibility]) -> Self {
        Self::from_strings(
            compatibilities
                .iter()
                .flat_map(|c| c.cluster_versions.iter()),
        )
    }

    /// Maximum under numeric tuple order
    pub fn latest(&self) -> Option<&ClusterVersion> {
        self.0.iter().next_back()
    }

    /// Versions numerically greater than `current`, ascending
    pub fn newer_than<'a>(&'a self, current: &'a ClusterVersion) -> impl Iterator<Item = &'a ClusterVersion> {
        self.0.iter().filter(move |v| v.parts() > current.parts())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterVersion> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sorted catalog of supported versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCatalog {
    pub versions: Vec<String>,
    pub latest_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VersionCatalog {
    pub fn from_set(set: &VersionSet) -> Self {
        Self {
            versions: set.iter().map(|v| v.to_string()).collect(),
            latest_version: set.latest().map(|v| v.to_string()),
            error: None,
        }
    }

    pub fn failed(error: &FleetError) -> Self {
        Self {
            versions: Vec::new(),
            latest_version: None,
            error: Some(error.to_string()),
        }
    }
}

/// Upgrade eligibility of one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeStatus {
    pub cluster_name: String,
    pub current_version: String,
    pub latest_version: String,
    pub is_up_to_date: bool,
    pub available_upgrades: Vec<String>,
    pub upgrade_recommended: bool,
}

/// Compare a cluster's version against the known set.
///
/// With an empty set the current version is treated as the latest.
pub fn assess_upgrade(cluster_name: &str, current: &str, known: &VersionSet) -> FleetResult<UpgradeStatus> {
    let current: ClusterVersion = current.parse()?;
    let latest = known.latest().unwrap_or(&current).clone();

    let available_upgrades: Vec<String> = known.newer_than(&current).map(|v| v.to_string()).collect();

    Ok(UpgradeStatus {
        cluster_name: cluster_name.to_string(),
        current_version: current.to_string(),
        latest_version: latest.to_string(),
        is_up_to_date: current == latest,
        upgrade_recommended: !available_upgrades.is_empty(),
        available_upgrades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ClusterVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_numeric_not_lexicographic_order() {
        let set = VersionSet::from_strings(["1.28", "1.29", "1.30", "1.9"]);
        assert_eq!(set.latest().map(|v| v.as_str()), Some("1.30"));

        let ordered: Vec<&str> = set.iter().map(|v| v.as_str()).collect();
        assert_eq!(ordered, vec!["1.9", "1.28", "1.29", "1.30"]);
    }

    #[test]
    fn test_shorter_prefix_is_smaller() {
        assert!(v("1.30") < v("1.30.1"));
        assert!(v("1.29.9") < v("1.30"));
        assert_eq!(v("1.30").cmp(&v("1.30")), Ordering::Equal);
    }

    #[test]
    fn test_equal_numbers_with_different_spelling_stay_distinct() {
        let set = VersionSet::from_strings(["1.30", "01.30", "1.29"]);
        assert_eq!(set.len(), 3);
        assert_ne!(v("1.30"), v("01.30"));

        let status = assess_upgrade("prod", "01.30", &set).unwrap();
        assert_eq!(status.latest_version, "1.30");
        assert!(!status.is_up_to_date);
        assert!(status.available_upgrades.is_empty());
    }

    #[test]
    fn test_unparseable_versions_rejected() {
        assert!("1.x".parse::<ClusterVersion>().is_err());
        assert!("".parse::<ClusterVersion>().is_err());
        assert!("1..2".parse::<ClusterVersion>().is_err());

        let set = VersionSet::from_strings(["1.29", "latest", "1.30"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_upgrade_available() {
        let set = VersionSet::from_strings(["1.28", "1.29", "1.30"]);
        let status = assess_upgrade("prod", "1.28", &set).unwrap();

        assert!(!status.is_up_to_date);
        assert!(status.upgrade_recommended);
        assert_eq!(status.latest_version, "1.30");
        assert_eq!(status.available_upgrades, vec!["1.29", "1.30"]);
    }

    #[test]
    fn test_up_to_date_cluster() {
        let set = VersionSet::from_strings(["1.28", "1.29"]);
        let status = assess_upgrade("prod", "1.29", &set).unwrap();
        assert!(status.is_up_to_date);
        assert!(status.available_upgrades.is_empty());
        assert!(!status.upgrade_recommended);
    }

    #[test]
    fn test_empty_set_treats_current_as_latest() {
        let status = assess_upgrade("dev", "1.27", &VersionSet::default()).unwrap();
        assert_eq!(status.latest_version, "1.27");
        assert!(status.is_up_to_date);
    }

    #[test]
    fn test_unparseable_current_version_is_invalid_state() {
        let err = assess_upgrade("dev", "v1", &VersionSet::default()).unwrap_err();
        assert!(matches!(err, FleetError::InvalidState(_)));
    }

    #[test]
    fn test_set_from_addon_compatibilities() {
        let compat = vec![
            AddonCompatibility {
                addon_name: "vpc-cni".into(),
                addon_version: "v1.18.0".into(),
                cluster_versions: vec!["1.29".into(), "1.30".into()],
            },
            AddonCompatibility {
                addon_name: "coredns".into(),
                addon_version: "v1.11.1".into(),
                cluster_versions: vec!["1.30".into(), "1.28".into()],
            },
        ];

        let catalog = VersionCatalog::from_set(&VersionSet::from_compatibilities(&compat));
        assert_eq!(catalog.versions, vec!["1.28", "1.29", "1.30"]);
        assert_eq!(catalog.latest_version.as_deref(), Some("1.30"));
    }
}

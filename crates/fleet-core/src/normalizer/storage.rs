//! Config maps, secrets and volume claims

use super::{describe, ResourceDescriptor, ResourceDetail};
use crate::error::FleetResult;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapDetail {
    pub data_keys: Vec<String>,
    pub data_count: usize,
}

/// Secret metadata. Values are never carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretDetail {
    #[serde(rename = "type")]
    pub secret_type: String,
    pub data_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeClaimDetail {
    pub volume: Option<String>,
    pub capacity: Option<String>,
    pub access_modes: Vec<String>,
    pub storage_class: Option<String>,
}

pub(super) fn config_map(item: Value) -> FleetResult<ResourceDescriptor> {
    let map: ConfigMap = serde_json::from_value(item)?;
    let mut data_keys: Vec<String> = map.data.map(|d| d.into_keys().collect()).unwrap_or_default();
    data_keys.extend(map.binary_data.map(|d| d.into_keys()).into_iter().flatten());
    data_keys.sort();

    Ok(describe(
        map.metadata,
        None,
        ResourceDetail::ConfigMap(ConfigMapDetail {
            data_count: data_keys.len(),
            data_keys,
        }),
    ))
}

pub(super) fn secret(item: Value) -> FleetResult<ResourceDescriptor> {
    let secret: Secret = serde_json::from_value(item)?;

    Ok(describe(
        secret.metadata,
        None,
        ResourceDetail::Secret(SecretDetail {
            secret_type: secret.type_.unwrap_or_else(|| "Opaque".to_string()),
            data_keys: secret.data.map(|d| d.into_keys().collect()).unwrap_or_default(),
        }),
    ))
}

pub(super) fn volume_claim(item: Value) -> FleetResult<ResourceDescriptor> {
    let claim: PersistentVolumeClaim = serde_json::from_value(item)?;
    let spec = claim.spec.unwrap_or_default();
    let status = claim.status.unwrap_or_default();

    Ok(describe(
        claim.metadata,
        status.phase,
        ResourceDetail::PersistentVolumeClaim(VolumeClaimDetail {
            volume: spec.volume_name,
            capacity: status
                .capacity
                .and_then(|mut c| c.remove("storage"))
                .map(|q| q.0),
            access_modes: spec.access_modes.unwrap_or_default(),
            storage_class: spec.storage_class_name,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_map_keys() {
        let item = json!({
            "metadata": {"name": "app-config", "namespace": "shop"},
            "data": {"LOG_LEVEL": "info", "FEATURE_X": "on"}
        });

        match config_map(item).unwrap().detail {
            ResourceDetail::ConfigMap(d) => {
                assert_eq!(d.data_keys, vec!["FEATURE_X", "LOG_LEVEL"]);
                assert_eq!(d.data_count, 2);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_config_map_without_data() {
        match config_map(json!({"metadata": {"name": "empty"}, "data": null})).unwrap().detail {
            ResourceDetail::ConfigMap(d) => assert_eq!(d.data_count, 0),
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_config_map_counts_binary_keys() {
        let item = json!({
            "metadata": {"name": "certs"},
            "data": {"ca.crt": "---"},
            "binaryData": {"keystore.jks": "AAEC"}
        });
        match config_map(item).unwrap().detail {
            ResourceDetail::ConfigMap(d) => assert_eq!(d.data_keys, vec!["ca.crt", "keystore.jks"]),
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_secret_never_exposes_values() {
        let item = json!({
            "metadata": {"name": "db-creds", "namespace": "shop"},
            "data": {"password": "aHVudGVyMg=="}
        });

        let descriptor = secret(item).unwrap();
        let rendered = serde_json::to_string(&descriptor).unwrap();
        assert!(!rendered.contains("aHVudGVyMg=="));

        match descriptor.detail {
            ResourceDetail::Secret(d) => {
                assert_eq!(d.secret_type, "Opaque");
                assert_eq!(d.data_keys, vec!["password"]);
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_volume_claim_fields() {
        let item = json!({
            "metadata": {"name": "data-db-0", "namespace": "shop"},
            "spec": {"volumeName": "pvc-123", "accessModes": ["ReadWriteOnce"], "storageClassName": "gp3"},
            "status": {"phase": "Bound", "capacity": {"storage": "20Gi"}}
        });

        let descriptor = volume_claim(item).unwrap();
        assert_eq!(descriptor.status.as_deref(), Some("Bound"));

        match descriptor.detail {
            ResourceDetail::PersistentVolumeClaim(d) => {
                assert_eq!(d.volume.as_deref(), Some("pvc-123"));
                assert_eq!(d.capacity.as_deref(), Some("20Gi"));
                assert_eq!(d.access_modes, vec!["ReadWriteOnce"]);
                assert_eq!(d.storage_class.as_deref(), Some("gp3"));
            }
            other => panic!("unexpected detail {:?}", other),
        }
    }
}

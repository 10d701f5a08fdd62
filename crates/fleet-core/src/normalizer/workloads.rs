//! Workload kinds: pods and their controllers

use super::{count, count_or_zero, describe, ratio, timestamp, ResourceDescriptor, ResourceDetail};
use crate::error::FleetResult;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{Pod, PodSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodDetail {
    /// Ready containers over total containers
    pub ready: String,
    /// Restart count summed across containers
    pub restarts: u32,
    pub node: Option<String>,
    pub containers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentDetail {
    /// Ready replicas over desired replicas
    pub ready: String,
    pub up_to_date: u32,
    pub available: u32,
    pub containers: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetDetail {
    pub ready: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonSetDetail {
    pub desired: u32,
    pub current: u32,
    pub ready: u32,
    pub up_to_date: u32,
    pub available: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSetDetail {
    pub desired: u32,
    pub current: u32,
    pub ready: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    /// Succeeded over requested completions (one when unspecified)
    pub completions: String,
    /// Completion time, when finished
    pub duration: Option<String>,
    pub active: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobDetail {
    pub schedule: Option<String>,
    pub suspend: bool,
    pub active: u32,
    pub last_schedule: Option<String>,
}

fn container_names(spec: Option<&PodSpec>) -> Vec<String> {
    spec.map(|s| s.containers.iter().map(|c| c.name.clone()).collect())
        .unwrap_or_default()
}

pub(super) fn pod(item: Value) -> FleetResult<ResourceDescriptor> {
    let pod: Pod = serde_json::from_value(item)?;
    let status = pod.status.unwrap_or_default();
    let statuses = status.container_statuses.unwrap_or_default();

    let ready_count = statuses.iter().filter(|c| c.ready).count() as u32;
    let restarts = statuses.iter().map(|c| count(c.restart_count)).sum();
    let spec = pod.spec.as_ref();

    Ok(describe(
        pod.metadata,
        Some(status.phase.unwrap_or_else(|| "Unknown".to_string())),
        ResourceDetail::Pod(PodDetail {
            ready: ratio(ready_count, statuses.len() as u32),
            restarts,
            node: spec.and_then(|s| s.node_name.clone()),
            containers: container_names(spec),
        }),
    ))
}

pub(super) fn deployment(item: Value) -> FleetResult<ResourceDescriptor> {
    let deployment: Deployment = serde_json::from_value(item)?;
    let spec = deployment.spec.unwrap_or_default();
    let status = deployment.status.unwrap_or_default();
    let template = spec.template.spec.as_ref();

    Ok(describe(
        deployment.metadata,
        None,
        ResourceDetail::Deployment(DeploymentDetail {
            ready: ratio(count_or_zero(status.ready_replicas), count_or_zero(spec.replicas)),
            up_to_date: count_or_zero(status.updated_replicas),
            available: count_or_zero(status.available_replicas),
            containers: container_names(template),
            images: template
                .map(|t| {
                    t.containers
                        .iter()
                        .map(|c| c.image.clone().unwrap_or_default())
                        .collect()
                })
                .unwrap_or_default(),
        }),
    ))
}

pub(super) fn stateful_set(item: Value) -> FleetResult<ResourceDescriptor> {
    let set: StatefulSet = serde_json::from_value(item)?;
    let desired = set.spec.as_ref().and_then(|s| s.replicas);
    let ready = set.status.as_ref().and_then(|s| s.ready_replicas);

    Ok(describe(
        set.metadata,
        None,
        ResourceDetail::StatefulSet(StatefulSetDetail {
            ready: ratio(count_or_zero(ready), count_or_zero(desired)),
        }),
    ))
}

pub(super) fn replica_set(item: Value) -> FleetResult<ResourceDescriptor> {
    let set: ReplicaSet = serde_json::from_value(item)?;
    let status = set.status.unwrap_or_default();

    Ok(describe(
        set.metadata,
        None,
        ResourceDetail::ReplicaSet(ReplicaSetDetail {
            desired: count_or_zero(set.spec.and_then(|s| s.replicas)),
            current: count(status.replicas),
            ready: count_or_zero(status.ready_replicas),
        }),
    ))
}

pub(super) fn daemon_set(item: Value) -> FleetResult<ResourceDescriptor> {
    let set: DaemonSet = serde_json::from_value(item)?;
    let status = set.status.unwrap_or_default();

    Ok(describe(
        set.metadata,
        None,
        ResourceDetail::DaemonSet(DaemonSetDetail {
            desired: count(status.desired_number_scheduled),
            current: count(status.current_number_scheduled),
            ready: count(status.number_ready),
            up_to_date: count_or_zero(status.updated_number_scheduled),
            available: count_or_zero(status.number_available),
        }),
    ))
}

pub(super) fn job(item: Value) -> FleetResult<ResourceDescriptor> {
    let job: Job = serde_json::from_value(item)?;
    let status = job.status.unwrap_or_default();
    let completions = job.spec.and_then(|s| s.completions).map(count).unwrap_or(1);

    Ok(describe(
        job.metadata,
        None,
        ResourceDetail::Job(JobDetail {
            completions: ratio(count_or_zero(status.succeeded), completions),
            duration: status.completion_time.as_ref().map(timestamp),
            active: count_or_zero(status.active),
            failed: count_or_zero(status.failed),
        }),
    ))
}

pub(super) fn cron_job(item: Value) -> FleetResult<ResourceDescriptor> {
    let cron: CronJob = serde_json::from_value(item)?;
    let spec = cron.spec.unwrap_or_default();
    let status = cron.status.unwrap_or_default();

    Ok(describe(
        cron.metadata,
        None,
        ResourceDetail::CronJob(CronJobDetail {
            schedule: Some(spec.schedule).filter(|s| !s.is_empty()),
            suspend: spec.suspend.unwrap_or(false),
            active: status.active.map(|refs| refs.len() as u32).unwrap_or(0),
            last_schedule: status.last_schedule_time.as_ref().map(timestamp),
        }),
    ))
}

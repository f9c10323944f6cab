//! cluster-autoscaler Deployment
//!
//! Builds the complete desired Deployment for the autoscaler of one hosted
//! control plane. The autoscaler runs next to the control plane and talks to
//! the hosted cluster through a mounted kubeconfig.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, HTTPGetAction, KeyToPath,
    ObjectFieldSelector, PodSpec, PodTemplateSpec, Probe, ResourceRequirements, Secret,
    SecretVolumeSource, ServiceAccount, Toleration, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use tracing::debug;

use hcp_common::config::{CONTROL_PLANE_COMPONENT_LABEL, DEFAULT_PRIORITY_CLASS};
use hcp_common::error::require;
use hcp_common::prober::{availability_prober, in_cluster_kas_ready_url};
use hcp_common::{
    AutoscalingOptions, DeploymentConfig, HostedControlPlane, OwnerRef, Result, Scheduling,
};

use crate::args::AutoscalerArgs;
use crate::{
    AUTOSCALER_NAME, KUBECONFIG_MOUNT_PATH, KUBECONFIG_PATH, KUBECONFIG_SECRET_KEY,
    KUBECONFIG_VOLUME, NAMESPACE_ENV_VAR,
};

const AUTOSCALER_COMMAND: &str = "/usr/bin/cluster-autoscaler";
const HEALTH_CHECK_PATH: &str = "/health-check";
const METRICS_PORT: i32 = 8085;
const MASTER_TAINT_KEY: &str = "node-role.kubernetes.io/master";
const TERMINATION_GRACE_PERIOD_SECONDS: i64 = 10;

/// Container images the autoscaler Deployment runs
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutoscalerImages {
    /// cluster-autoscaler image
    pub cluster_autoscaler: String,
    /// Image providing the availability prober binary
    pub availability_prober: String,
}

/// Selector labels. Immutable once the Deployment exists, so this must never change.
pub fn selector_labels() -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), AUTOSCALER_NAME.to_string())])
}

/// Pod labels. A superset of the selector; free to evolve.
pub fn pod_labels() -> BTreeMap<String, String> {
    let mut labels = selector_labels();
    labels.insert(
        CONTROL_PLANE_COMPONENT_LABEL.to_string(),
        AUTOSCALER_NAME.to_string(),
    );
    labels
}

/// Populate `deployment` with the desired autoscaler spec.
///
/// Inputs are validated before anything is written: on error the deployment
/// is left exactly as it was passed in. Metadata other than the owner
/// reference (name, namespace, labels) belongs to the caller.
pub fn reconcile_autoscaler_deployment(
    deployment: &mut Deployment,
    hcp: &HostedControlPlane,
    sa: &ServiceAccount,
    kubeconfig_secret: &Secret,
    options: &AutoscalingOptions,
    images: &AutoscalerImages,
    set_default_security_context: bool,
) -> Result<()> {
    let sa_name = require("ServiceAccount", "metadata.name", sa.metadata.name.as_deref())?;
    let secret_name = require(
        "Secret",
        "metadata.name",
        kubeconfig_secret.metadata.name.as_deref(),
    )?;
    let hcp_namespace = require(
        "HostedControlPlane",
        "metadata.namespace",
        hcp.metadata.namespace.as_deref(),
    )?;
    let namespace = deployment
        .metadata
        .namespace
        .clone()
        .unwrap_or_else(|| hcp_namespace.to_string());
    let owner = OwnerRef::from_hosted_control_plane(hcp)?;

    let args = AutoscalerArgs::new(options);

    let mut pod_spec = PodSpec {
        service_account_name: Some(sa_name.to_string()),
        termination_grace_period_seconds: Some(TERMINATION_GRACE_PERIOD_SECONDS),
        tolerations: Some(vec![Toleration {
            key: Some(MASTER_TAINT_KEY.to_string()),
            effect: Some("NoSchedule".to_string()),
            ..Default::default()
        }]),
        volumes: Some(vec![kubeconfig_volume(secret_name)]),
        containers: vec![autoscaler_container(&images.cluster_autoscaler, &args)],
        ..Default::default()
    };

    availability_prober(
        &in_cluster_kas_ready_url(&namespace, hcp.spec.api_port()),
        &images.availability_prober,
        &mut pod_spec,
    );

    owner.apply_to(deployment);
    deployment.spec = Some(DeploymentSpec {
        replicas: Some(1),
        selector: LabelSelector {
            match_labels: Some(selector_labels()),
            ..Default::default()
        },
        template: PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(pod_labels()),
                ..Default::default()
            }),
            spec: Some(pod_spec),
        },
        ..Default::default()
    });

    deployment_config(hcp, hcp_namespace, set_default_security_context)
        .apply_to(deployment);

    debug!(
        namespace = %namespace,
        hosted_control_plane = %owner.reference().name,
        args = args.flags().len(),
        "reconciled cluster-autoscaler deployment"
    );
    Ok(())
}

fn deployment_config(
    hcp: &HostedControlPlane,
    hcp_namespace: &str,
    set_default_security_context: bool,
) -> DeploymentConfig {
    let mut config = DeploymentConfig {
        replicas: 1,
        scheduling: Scheduling {
            priority_class: Some(DEFAULT_PRIORITY_CLASS.to_string()),
            ..Default::default()
        },
        set_default_security_context,
        ..Default::default()
    };
    config.set_release_image_annotation(&hcp.spec.release_image);
    config.set_colocation(hcp_namespace);
    config.set_restart_annotation(&hcp.metadata);
    config.set_control_plane_isolation(hcp_namespace);
    config
}

fn kubeconfig_volume(secret_name: &str) -> Volume {
    Volume {
        name: KUBECONFIG_VOLUME.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret_name.to_string()),
            items: Some(vec![KeyToPath {
                key: KUBECONFIG_SECRET_KEY.to_string(),
                path: KUBECONFIG_PATH.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn autoscaler_container(image: &str, args: &AutoscalerArgs) -> Container {
    Container {
        name: AUTOSCALER_NAME.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        command: Some(vec![AUTOSCALER_COMMAND.to_string()]),
        args: Some(args.to_args()),
        volume_mounts: Some(vec![VolumeMount {
            name: KUBECONFIG_VOLUME.to_string(),
            mount_path: KUBECONFIG_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..Default::default()
        }]),
        env: Some(vec![EnvVar {
            name: NAMESPACE_ENV_VAR.to_string(),
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: "metadata.namespace".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]),
        // Requests only, never limits
        resources: Some(ResourceRequirements {
            requests: Some(BTreeMap::from([
                ("memory".to_string(), Quantity("35Mi".to_string())),
                ("cpu".to_string(), Quantity("10m".to_string())),
            ])),
            ..Default::default()
        }),
        ports: Some(vec![ContainerPort {
            name: Some("metrics".to_string()),
            container_port: METRICS_PORT,
            ..Default::default()
        }]),
        liveness_probe: Some(health_probe(60, 5)),
        readiness_probe: Some(health_probe(15, 3)),
        ..Default::default()
    }
}

fn health_probe(initial_delay_seconds: i32, failure_threshold: i32) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(HEALTH_CHECK_PATH.to_string()),
            port: IntOrString::Int(METRICS_PORT),
            scheme: Some("HTTP".to_string()),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay_seconds),
        period_seconds: Some(60),
        success_threshold: Some(1),
        failure_threshold: Some(failure_threshold),
        timeout_seconds: Some(5),
        ..Default::default()
    }
}

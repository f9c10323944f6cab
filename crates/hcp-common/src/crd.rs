//! HostedControlPlane Custom Resource Definition
//!
//! Only the fields the component reconcilers read are modeled here. The
//! descriptor is read-only input: reconcilers never write to it.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_API_SERVER_PORT;

/// Specification for a HostedControlPlane
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "hypershift.openshift.io",
    version = "v1alpha1",
    kind = "HostedControlPlane",
    plural = "hostedcontrolplanes",
    shortname = "hcp",
    namespaced,
    printcolumn = r#"{"name":"Release","type":"string","jsonPath":".spec.releaseImage"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct HostedControlPlaneSpec {
    /// Release image the control plane components are built from
    pub release_image: String,

    /// Port the hosted API server listens on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_port: Option<i32>,

    /// Cluster autoscaler tuning
    #[serde(default)]
    pub autoscaling: AutoscalingOptions,
}

impl HostedControlPlaneSpec {
    /// API server port, falling back to the default when unset
    pub fn api_port(&self) -> i32 {
        self.api_port.unwrap_or(DEFAULT_API_SERVER_PORT)
    }
}

/// User-facing cluster autoscaler options
///
/// Every field is optional. An unset field means the autoscaler runs with
/// its own built-in default for that setting.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AutoscalingOptions {
    /// Maximum number of nodes across all node groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nodes_total: Option<i32>,

    /// Seconds the autoscaler waits for pods to terminate gracefully on scale down
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pod_grace_period: Option<i32>,

    /// How long to wait for a node to be provisioned (e.g. "15m")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_node_provision_time: Option<String>,

    /// Pods below this priority are expendable and never trigger scale up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_priority_threshold: Option<i32>,
}

impl AutoscalingOptions {
    /// Provision time, treating an empty string the same as unset
    pub fn max_node_provision_time(&self) -> Option<&str> {
        self.max_node_provision_time
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_port_defaults_to_6443() {
        let spec = HostedControlPlaneSpec::default();
        assert_eq!(spec.api_port(), 6443);

        let spec = HostedControlPlaneSpec {
            api_port: Some(7443),
            ..Default::default()
        };
        assert_eq!(spec.api_port(), 7443);
    }

    #[test]
    fn empty_provision_time_is_unset() {
        let options = AutoscalingOptions {
            max_node_provision_time: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(options.max_node_provision_time(), None);

        let options = AutoscalingOptions {
            max_node_provision_time: Some("15m".to_string()),
            ..Default::default()
        };
        assert_eq!(options.max_node_provision_time(), Some("15m"));
    }

    #[test]
    fn deserializes_from_yaml() {
        let yaml = r#"
apiVersion: hypershift.openshift.io/v1alpha1
kind: HostedControlPlane
metadata:
  name: demo
  namespace: clusters-demo
  uid: 4b0e1c1e-0000-4000-8000-000000000001
spec:
  releaseImage: quay.io/openshift-release-dev/ocp-release:4.16.0-x86_64
  apiPort: 7443
  autoscaling:
    maxNodesTotal: 10
    maxNodeProvisionTime: 20m
    podPriorityThreshold: -10
"#;
        let hcp: HostedControlPlane = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(hcp.spec.api_port(), 7443);
        assert_eq!(hcp.spec.autoscaling.max_nodes_total, Some(10));
        assert_eq!(hcp.spec.autoscaling.max_pod_grace_period, None);
        assert_eq!(hcp.spec.autoscaling.max_node_provision_time(), Some("20m"));
        assert_eq!(hcp.spec.autoscaling.pod_priority_threshold, Some(-10));
    }

    #[test]
    fn autoscaling_defaults_when_omitted() {
        let yaml = r#"
apiVersion: hypershift.openshift.io/v1alpha1
kind: HostedControlPlane
metadata:
  name: demo
spec:
  releaseImage: example.com/release:1
"#;
        let hcp: HostedControlPlane = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(hcp.spec.autoscaling, AutoscalingOptions::default());
    }
}

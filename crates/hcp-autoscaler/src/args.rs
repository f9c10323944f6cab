//! cluster-autoscaler command line
//!
//! Flags are kept as an ordered list of (name, optional value) pairs and
//! rendered to text in one place. Order is significant: the mandatory flags
//! come first in a fixed sequence, then the optional tuning flags.

use std::fmt;

use hcp_common::config::{
    RECOMMENDED_LEASE_DURATION, RECOMMENDED_RENEW_DEADLINE, RECOMMENDED_RETRY_PERIOD,
};
use hcp_common::AutoscalingOptions;

use crate::{KUBECONFIG_MOUNT_PATH, KUBECONFIG_PATH, NAMESPACE_ENV_VAR};

/// Flag for the maximum node count across node groups
pub const MAX_NODES_TOTAL_FLAG: &str = "max-nodes-total";
/// Flag for the pod termination grace period used on scale down
pub const MAX_GRACEFUL_TERMINATION_FLAG: &str = "max-graceful-termination-sec";
/// Flag for the node provisioning timeout
pub const MAX_NODE_PROVISION_TIME_FLAG: &str = "max-node-provision-time";
/// Flag for the expendable pod priority cutoff
pub const EXPENDABLE_PODS_PRIORITY_CUTOFF_FLAG: &str = "expendable-pods-priority-cutoff";

/// A single `--name` or `--name=value` flag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flag {
    name: &'static str,
    value: Option<String>,
}

impl Flag {
    /// A boolean switch with no value
    pub fn switch(name: &'static str) -> Self {
        Self { name, value: None }
    }

    /// A flag with a value, formatted with `Display`
    pub fn value(name: &'static str, value: impl fmt::Display) -> Self {
        Self {
            name,
            value: Some(value.to_string()),
        }
    }

    /// Flag name without the leading dashes
    pub fn name(&self) -> &str {
        self.name
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "--{}={}", self.name, value),
            None => write!(f, "--{}", self.name),
        }
    }
}

/// Ordered cluster-autoscaler arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoscalerArgs {
    flags: Vec<Flag>,
}

impl AutoscalerArgs {
    /// Arguments for the given options: mandatory flags, then optional ones
    pub fn new(options: &AutoscalingOptions) -> Self {
        let mut args = Self::mandatory();
        args.push_options(options);
        args
    }

    /// The fixed flags every autoscaler runs with
    pub fn mandatory() -> Self {
        let flags = vec![
            Flag::value("cloud-provider", "clusterapi"),
            // Resolved by the container runtime from the downward API env var
            Flag::value(
                "node-group-auto-discovery",
                format!("clusterapi:namespace=$({})", NAMESPACE_ENV_VAR),
            ),
            Flag::value(
                "kubeconfig",
                format!("{}/{}", KUBECONFIG_MOUNT_PATH, KUBECONFIG_PATH),
            ),
            Flag::switch("clusterapi-cloud-config-authoritative"),
            // emptyDir pods (grafana, image-registry) must not pin nodes after a scale out
            Flag::value("skip-nodes-with-local-storage", false),
            Flag::switch("alsologtostderr"),
            Flag::value("leader-elect-lease-duration", RECOMMENDED_LEASE_DURATION),
            Flag::value("leader-elect-retry-period", RECOMMENDED_RETRY_PERIOD),
            Flag::value("leader-elect-renew-deadline", RECOMMENDED_RENEW_DEADLINE),
            Flag::value("v", 4),
        ];
        Self { flags }
    }

    fn push_options(&mut self, options: &AutoscalingOptions) {
        if let Some(max_nodes) = options.max_nodes_total {
            self.flags.push(Flag::value(MAX_NODES_TOTAL_FLAG, max_nodes));
        }
        if let Some(grace_period) = options.max_pod_grace_period {
            self.flags
                .push(Flag::value(MAX_GRACEFUL_TERMINATION_FLAG, grace_period));
        }
        if let Some(provision_time) = options.max_node_provision_time() {
            self.flags
                .push(Flag::value(MAX_NODE_PROVISION_TIME_FLAG, provision_time));
        }
        if let Some(threshold) = options.pod_priority_threshold {
            self.flags
                .push(Flag::value(EXPENDABLE_PODS_PRIORITY_CUTOFF_FLAG, threshold));
        }
    }

    /// The flags in order
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// Render to the container `args` list
    pub fn to_args(&self) -> Vec<String> {
        self.flags.iter().map(Flag::to_string).collect()
    }
}

//! Shared defaults for hosted control plane components
//!
//! These values are process-wide and fixed at build time. Every component
//! deployed into a control plane namespace uses the same leader-election
//! timings and scheduling defaults so restarts hand off cleanly.

/// Recommended leader-election lease duration
pub const RECOMMENDED_LEASE_DURATION: &str = "137s";

/// Recommended leader-election renew deadline
pub const RECOMMENDED_RENEW_DEADLINE: &str = "107s";

/// Recommended leader-election retry period
pub const RECOMMENDED_RETRY_PERIOD: &str = "26s";

/// Priority class for control plane workloads
pub const DEFAULT_PRIORITY_CLASS: &str = "hypershift-control-plane";

/// API server port used when the descriptor does not set one
pub const DEFAULT_API_SERVER_PORT: i32 = 6443;

/// UID applied when a default pod security context is requested
pub const DEFAULT_SECURITY_CONTEXT_USER: i64 = 1001;

/// Pod label naming the control plane component
pub const CONTROL_PLANE_COMPONENT_LABEL: &str = "hypershift.openshift.io/control-plane-component";

/// Pod label used to colocate pods of the same hosted control plane
pub const HOSTED_CONTROL_PLANE_LABEL: &str = "hypershift.openshift.io/hosted-control-plane";

/// Node label and taint key for nodes dedicated to control planes
pub const CONTROL_PLANE_NODE_LABEL: &str = "hypershift.openshift.io/control-plane";

/// Node label and taint key for nodes dedicated to a single cluster
pub const CLUSTER_NODE_LABEL: &str = "hypershift.openshift.io/cluster";

/// Pod annotation recording the release image a workload was built from
pub const RELEASE_IMAGE_ANNOTATION: &str = "hypershift.openshift.io/release-image";

/// Annotation that forces a rollout when its value changes
pub const RESTART_DATE_ANNOTATION: &str = "hypershift.openshift.io/restart-date";

/// Topology key for colocation affinity
pub const HOSTNAME_TOPOLOGY_KEY: &str = "kubernetes.io/hostname";

//! Desired state for the hosted control plane cluster-autoscaler
//!
//! Three reconcilers fill in caller-owned objects:
//! - [`reconcile_autoscaler_deployment`] - the autoscaler Deployment
//! - [`reconcile_autoscaler_role`] - machine-API Role
//! - [`reconcile_autoscaler_role_binding`] - binds the Role to the service account
//!
//! Each is a pure function of its inputs: no cluster access, no retained
//! state, and calling it again with the same inputs yields the same object.
//!
//! ```rust,ignore
//! let owner = OwnerRef::from_hosted_control_plane(&hcp)?;
//! reconcile_autoscaler_role(&mut role, &owner)?;
//! reconcile_autoscaler_role_binding(&mut binding, &role, &sa, &owner)?;
//! reconcile_autoscaler_deployment(
//!     &mut deployment, &hcp, &sa, &kubeconfig, &hcp.spec.autoscaling, &images, false,
//! )?;
//! ```

#![deny(missing_docs)]

pub mod args;
pub mod deployment;
pub mod manifests;
pub mod rbac;

pub use args::{AutoscalerArgs, Flag};
pub use deployment::{reconcile_autoscaler_deployment, AutoscalerImages};
pub use manifests::{build_manifests, render_manifests, AutoscalerManifests, RenderInputs};
pub use rbac::{reconcile_autoscaler_role, reconcile_autoscaler_role_binding};

/// Name of the autoscaler container, and of the objects rendered for it
pub const AUTOSCALER_NAME: &str = "cluster-autoscaler";

/// Env var the downward API fills with the pod's namespace
pub const NAMESPACE_ENV_VAR: &str = "MY_NAMESPACE";

/// Volume carrying the hosted cluster kubeconfig
pub const KUBECONFIG_VOLUME: &str = "target-kubeconfig";

/// Key inside the kubeconfig secret
pub const KUBECONFIG_SECRET_KEY: &str = "value";

/// Directory the kubeconfig volume is mounted at
pub const KUBECONFIG_MOUNT_PATH: &str = "/mnt/kubeconfig";

/// File name of the kubeconfig inside the mount
pub const KUBECONFIG_PATH: &str = "target-kubeconfig";

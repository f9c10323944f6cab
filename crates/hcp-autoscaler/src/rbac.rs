//! RBAC for the cluster-autoscaler
//!
//! The Role is namespaced to the control plane, so granting every verb on
//! the machine API kinds only reaches this cluster's machines.

use k8s_openapi::api::core::v1::ServiceAccount;
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use tracing::debug;

use hcp_common::error::require;
use hcp_common::{OwnerRef, Result};

/// API group of the Cluster API machine resources
pub const CLUSTER_API_GROUP: &str = "cluster.x-k8s.io";

/// Resources the autoscaler creates, scales and deletes
pub const MACHINE_RESOURCES: [&str; 5] = [
    "machinedeployments",
    "machinedeployments/scale",
    "machines",
    "machinesets",
    "machinesets/scale",
];

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Set the autoscaler's single machine-API rule on `role`
pub fn reconcile_autoscaler_role(role: &mut Role, owner: &OwnerRef) -> Result<()> {
    owner.apply_to(role);
    role.rules = Some(vec![PolicyRule {
        api_groups: Some(vec![CLUSTER_API_GROUP.to_string()]),
        resources: Some(MACHINE_RESOURCES.iter().map(|r| r.to_string()).collect()),
        verbs: vec!["*".to_string()],
        ..Default::default()
    }]);
    debug!(role = ?role.metadata.name, "reconciled cluster-autoscaler role");
    Ok(())
}

/// Bind `role` to the autoscaler service account.
///
/// Only the Role's name is read, so the binding stays valid across Role
/// recreation. Nothing is written unless the role and service account are
/// fully identified.
pub fn reconcile_autoscaler_role_binding(
    binding: &mut RoleBinding,
    role: &Role,
    sa: &ServiceAccount,
    owner: &OwnerRef,
) -> Result<()> {
    let role_name = require("Role", "metadata.name", role.metadata.name.as_deref())?;
    let sa_name = require("ServiceAccount", "metadata.name", sa.metadata.name.as_deref())?;
    let sa_namespace = require(
        "ServiceAccount",
        "metadata.namespace",
        sa.metadata.namespace.as_deref(),
    )?;

    owner.apply_to(binding);
    binding.role_ref = RoleRef {
        api_group: RBAC_API_GROUP.to_string(),
        kind: "Role".to_string(),
        name: role_name.to_string(),
    };
    binding.subjects = Some(vec![Subject {
        kind: "ServiceAccount".to_string(),
        name: sa_name.to_string(),
        namespace: Some(sa_namespace.to_string()),
        ..Default::default()
    }]);

    debug!(
        binding = ?binding.metadata.name,
        role = %role_name,
        service_account = %sa_name,
        "reconciled cluster-autoscaler role binding"
    );
    Ok(())
}

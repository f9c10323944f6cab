//! Offline rendering of the full autoscaler object set
//!
//! Builds the Role, RoleBinding and Deployment from scratch with the same
//! reconcilers a controller would call, and serializes them to a
//! multi-document YAML stream.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use tracing::info;

use hcp_common::error::require;
use hcp_common::{Error, HostedControlPlane, OwnerRef, Result};

use crate::deployment::{reconcile_autoscaler_deployment, AutoscalerImages};
use crate::rbac::{reconcile_autoscaler_role, reconcile_autoscaler_role_binding};
use crate::AUTOSCALER_NAME;

/// Everything needed to render the autoscaler objects
#[derive(Clone, Debug)]
pub struct RenderInputs<'a> {
    /// Owning control plane; autoscaling options are read from its spec
    pub hosted_control_plane: &'a HostedControlPlane,
    /// Identity the autoscaler runs as
    pub service_account: &'a ServiceAccount,
    /// Secret holding the hosted cluster kubeconfig
    pub kubeconfig_secret: &'a Secret,
    /// Container images
    pub images: &'a AutoscalerImages,
    /// Request a non-root pod security context
    pub set_default_security_context: bool,
}

/// The rendered autoscaler object set
#[derive(Clone, Debug, PartialEq)]
pub struct AutoscalerManifests {
    /// Machine-API Role
    pub role: Role,
    /// Binding of the Role to the service account
    pub role_binding: RoleBinding,
    /// The autoscaler Deployment
    pub deployment: Deployment,
}

impl AutoscalerManifests {
    /// Serialize as a `---` separated YAML stream (Role, RoleBinding, Deployment)
    pub fn to_yaml(&self) -> Result<String> {
        let documents = [
            to_yaml_document("Role", &self.role)?,
            to_yaml_document("RoleBinding", &self.role_binding)?,
            to_yaml_document("Deployment", &self.deployment)?,
        ];
        Ok(documents.join("---\n"))
    }
}

fn to_yaml_document<T: Serialize>(kind: &str, obj: &T) -> Result<String> {
    serde_yaml::to_string(obj).map_err(|e| Error::serialization_for(kind, e.to_string()))
}

fn object_meta(namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(AUTOSCALER_NAME.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// Build the autoscaler objects into the control plane namespace
pub fn build_manifests(inputs: &RenderInputs<'_>) -> Result<AutoscalerManifests> {
    let hcp = inputs.hosted_control_plane;
    let namespace = require(
        "HostedControlPlane",
        "metadata.namespace",
        hcp.metadata.namespace.as_deref(),
    )?;
    let owner = OwnerRef::from_hosted_control_plane(hcp)?;

    let mut role = Role {
        metadata: object_meta(namespace),
        ..Default::default()
    };
    reconcile_autoscaler_role(&mut role, &owner)?;

    let mut role_binding = RoleBinding {
        metadata: object_meta(namespace),
        ..Default::default()
    };
    reconcile_autoscaler_role_binding(&mut role_binding, &role, inputs.service_account, &owner)?;

    let mut deployment = Deployment {
        metadata: object_meta(namespace),
        ..Default::default()
    };
    reconcile_autoscaler_deployment(
        &mut deployment,
        hcp,
        inputs.service_account,
        inputs.kubeconfig_secret,
        &hcp.spec.autoscaling,
        inputs.images,
        inputs.set_default_security_context,
    )?;

    info!(
        namespace = %namespace,
        hosted_control_plane = %owner.reference().name,
        "rendered cluster-autoscaler manifests"
    );

    Ok(AutoscalerManifests {
        role,
        role_binding,
        deployment,
    })
}

/// Build and serialize the autoscaler objects in one step
pub fn render_manifests(inputs: &RenderInputs<'_>) -> Result<String> {
    build_manifests(inputs)?.to_yaml()
}

//! Owner references from component objects back to their HostedControlPlane
//!
//! Every object a reconciler produces carries exactly one controller owner
//! reference so the garbage collector removes it with the control plane.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;

use crate::crd::HostedControlPlane;
use crate::error::{require, Error};
use crate::Result;

/// Controller owner reference to a HostedControlPlane
#[derive(Clone, Debug, PartialEq)]
pub struct OwnerRef {
    reference: OwnerReference,
}

impl OwnerRef {
    /// Build the owner reference for a HostedControlPlane.
    ///
    /// Fails if the descriptor has no name or uid (it has not been persisted).
    pub fn from_hosted_control_plane(hcp: &HostedControlPlane) -> Result<Self> {
        require("HostedControlPlane", "metadata.name", hcp.meta().name.as_deref())?;
        require("HostedControlPlane", "metadata.uid", hcp.meta().uid.as_deref())?;
        let reference = hcp.controller_owner_ref(&()).ok_or_else(|| {
            Error::configuration("HostedControlPlane", "cannot build owner reference")
        })?;
        Ok(Self { reference })
    }

    /// The underlying owner reference
    pub fn reference(&self) -> &OwnerReference {
        &self.reference
    }

    /// Replace the object's owner references with this one.
    ///
    /// Prior owner references are dropped, so applying twice is a no-op.
    pub fn apply_to<K: Resource>(&self, obj: &mut K) {
        obj.meta_mut().owner_references = Some(vec![self.reference.clone()]);
    }
}

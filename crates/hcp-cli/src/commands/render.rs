//! Render command

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use hcp_autoscaler::{render_manifests, AutoscalerImages, RenderInputs};
use hcp_common::HostedControlPlane;

use crate::{Error, Result};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// HostedControlPlane manifest (YAML)
    #[arg(short = 'f', long = "hosted-control-plane")]
    pub hosted_control_plane: PathBuf,

    /// cluster-autoscaler image
    #[arg(long, env = "HCP_AUTOSCALER_IMAGE")]
    pub autoscaler_image: String,

    /// Image providing the availability prober
    #[arg(long, env = "HCP_AVAILABILITY_PROBER_IMAGE")]
    pub availability_prober_image: String,

    /// Service account the autoscaler runs as (in the control plane namespace)
    #[arg(long, default_value = "cluster-autoscaler")]
    pub service_account: String,

    /// Secret holding the hosted cluster kubeconfig under the `value` key
    #[arg(long, default_value = "service-network-admin-kubeconfig")]
    pub kubeconfig_secret: String,

    /// Run pods with a non-root security context
    #[arg(long)]
    pub set_default_security_context: bool,
}

pub fn run(args: RenderArgs) -> Result<()> {
    let hcp = load_hosted_control_plane(&args.hosted_control_plane)?;
    let yaml = render(&args, &hcp)?;
    std::io::stdout()
        .lock()
        .write_all(yaml.as_bytes())
        .map_err(Error::Output)
}

fn load_hosted_control_plane(path: &Path) -> Result<HostedControlPlane> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let hcp = serde_yaml::from_str(&content).map_err(|source| Error::InvalidYaml {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded HostedControlPlane");
    Ok(hcp)
}

fn render(args: &RenderArgs, hcp: &HostedControlPlane) -> Result<String> {
    let namespace = hcp.metadata.namespace.clone();
    let service_account = ServiceAccount {
        metadata: ObjectMeta {
            name: Some(args.service_account.clone()),
            namespace: namespace.clone(),
            ..Default::default()
        },
        ..Default::default()
    };
    let kubeconfig_secret = Secret {
        metadata: ObjectMeta {
            name: Some(args.kubeconfig_secret.clone()),
            namespace,
            ..Default::default()
        },
        ..Default::default()
    };
    let images = AutoscalerImages {
        cluster_autoscaler: args.autoscaler_image.clone(),
        availability_prober: args.availability_prober_image.clone(),
    };

    Ok(render_manifests(&RenderInputs {
        hosted_control_plane: hcp,
        service_account: &service_account,
        kubeconfig_secret: &kubeconfig_secret,
        images: &images,
        set_default_security_context: args.set_default_security_context,
    })?)
}

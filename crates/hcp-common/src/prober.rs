//! Availability prober init container
//!
//! Gates a pod's start on an HTTP endpoint answering successfully. Components
//! that talk to the hosted API server use it so they do not start
//! reconciling before the API server is reachable.

use k8s_openapi::api::core::v1::{Container, PodSpec};

/// Name of the injected init container
pub const AVAILABILITY_PROBER_CONTAINER: &str = "availability-prober";

const AVAILABILITY_PROBER_COMMAND: &str = "/usr/bin/availability-prober";

/// In-cluster readiness URL of a hosted API server
pub fn in_cluster_kas_ready_url(namespace: &str, port: i32) -> String {
    format!("https://kube-apiserver.{}.svc:{}/readyz", namespace, port)
}

/// Inject (or replace) the availability prober init container.
///
/// The prober runs ahead of every other init container. Injecting twice
/// leaves a single prober.
pub fn availability_prober(target_url: &str, image: &str, spec: &mut PodSpec) {
    let prober = Container {
        name: AVAILABILITY_PROBER_CONTAINER.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        command: Some(vec![AVAILABILITY_PROBER_COMMAND.to_string()]),
        args: Some(vec!["--target".to_string(), target_url.to_string()]),
        ..Default::default()
    };

    let init_containers = spec.init_containers.get_or_insert_with(Vec::new);
    init_containers.retain(|c| c.name != AVAILABILITY_PROBER_CONTAINER);
    init_containers.insert(0, prober);
}

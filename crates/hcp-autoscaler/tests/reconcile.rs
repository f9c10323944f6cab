//! End-to-end behaviour of the autoscaler reconcilers on fresh and
//! previously-reconciled objects.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use rstest::rstest;

use hcp_autoscaler::args::{
    EXPENDABLE_PODS_PRIORITY_CUTOFF_FLAG, MAX_GRACEFUL_TERMINATION_FLAG,
    MAX_NODES_TOTAL_FLAG, MAX_NODE_PROVISION_TIME_FLAG,
};
use hcp_autoscaler::rbac::MACHINE_RESOURCES;
use hcp_autoscaler::{
    reconcile_autoscaler_deployment, reconcile_autoscaler_role,
    reconcile_autoscaler_role_binding, AutoscalerArgs, AutoscalerImages,
};
use hcp_common::{AutoscalingOptions, HostedControlPlane, HostedControlPlaneSpec, OwnerRef};

const OPTIONAL_FLAGS: [&str; 4] = [
    MAX_NODES_TOTAL_FLAG,
    MAX_GRACEFUL_TERMINATION_FLAG,
    MAX_NODE_PROVISION_TIME_FLAG,
    EXPENDABLE_PODS_PRIORITY_CUTOFF_FLAG,
];

fn hosted_control_plane() -> HostedControlPlane {
    let mut hcp = HostedControlPlane::new(
        "demo",
        HostedControlPlaneSpec {
            release_image: "quay.io/ocp-release:4.16.0".to_string(),
            ..Default::default()
        },
    );
    hcp.metadata.namespace = Some("clusters-demo".to_string());
    hcp.metadata.uid = Some("8c1b7c8a-1111-4222-8333-444455556666".to_string());
    hcp
}

fn meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

fn service_account() -> ServiceAccount {
    ServiceAccount {
        metadata: meta("cluster-autoscaler", "clusters-demo"),
        ..Default::default()
    }
}

fn kubeconfig_secret() -> Secret {
    Secret {
        metadata: meta("service-network-admin-kubeconfig", "clusters-demo"),
        ..Default::default()
    }
}

fn images() -> AutoscalerImages {
    AutoscalerImages {
        cluster_autoscaler: "quay.io/openshift/cluster-autoscaler:4.16".to_string(),
        availability_prober: "quay.io/hypershift/hypershift:latest".to_string(),
    }
}

fn reconcile_into(deployment: &mut Deployment, options: &AutoscalingOptions) {
    reconcile_autoscaler_deployment(
        deployment,
        &hosted_control_plane(),
        &service_account(),
        &kubeconfig_secret(),
        options,
        &images(),
        false,
    )
    .unwrap();
}

fn fresh(options: &AutoscalingOptions) -> Deployment {
    let mut deployment = Deployment {
        metadata: meta("cluster-autoscaler", "clusters-demo"),
        ..Default::default()
    };
    reconcile_into(&mut deployment, options);
    deployment
}

fn container_args(deployment: &Deployment) -> Vec<String> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .and_then(|p| p.containers.first())
        .and_then(|c| c.args.clone())
        .unwrap_or_default()
}

fn selector(deployment: &Deployment) -> BTreeMap<String, String> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.selector.match_labels.clone())
        .unwrap_or_default()
}

fn all_options() -> AutoscalingOptions {
    AutoscalingOptions {
        max_nodes_total: Some(100),
        max_pod_grace_period: Some(600),
        max_node_provision_time: Some("15m".to_string()),
        pod_priority_threshold: Some(-5),
    }
}

#[rstest]
#[case::unset(AutoscalingOptions::default())]
#[case::all_set(all_options())]
fn reconcile_is_byte_identical_on_repeat(#[case] options: AutoscalingOptions) {
    let first = serde_json::to_vec(&fresh(&options)).unwrap();
    let second = serde_json::to_vec(&fresh(&options)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn reconciling_an_existing_deployment_converges() {
    let mut deployment = fresh(&all_options());
    reconcile_into(&mut deployment, &AutoscalingOptions::default());
    assert_eq!(deployment, fresh(&AutoscalingOptions::default()));
}

#[test]
fn only_max_nodes_total_set() {
    let options = AutoscalingOptions {
        max_nodes_total: Some(5),
        ..Default::default()
    };
    let args = container_args(&fresh(&options));
    assert!(args.contains(&"--max-nodes-total=5".to_string()));
    for flag in &OPTIONAL_FLAGS[1..] {
        assert!(!args.iter().any(|a| a.starts_with(&format!("--{}", flag))));
    }
}

#[test]
fn no_options_means_only_mandatory_flags() {
    let args = container_args(&fresh(&AutoscalingOptions::default()));
    assert_eq!(args, AutoscalerArgs::mandatory().to_args());
    assert_eq!(args.len(), 10);
    for flag in OPTIONAL_FLAGS {
        assert!(!args.iter().any(|a| a.starts_with(&format!("--{}", flag))));
    }
}

#[test]
fn negative_priority_threshold_passes_through() {
    let options = AutoscalingOptions {
        pod_priority_threshold: Some(-10),
        ..Default::default()
    };
    let args = container_args(&fresh(&options));
    assert!(args.contains(&"--expendable-pods-priority-cutoff=-10".to_string()));
}

#[rstest]
#[case::unset(AutoscalingOptions::default())]
#[case::all_set(all_options())]
#[case::partial(AutoscalingOptions { max_pod_grace_period: Some(30), ..Default::default() })]
fn selector_and_replicas_never_change(#[case] options: AutoscalingOptions) {
    let baseline = fresh(&AutoscalingOptions::default());
    let deployment = fresh(&options);
    assert_eq!(selector(&deployment), selector(&baseline));
    assert_eq!(
        selector(&deployment),
        BTreeMap::from([("app".to_string(), "cluster-autoscaler".to_string())])
    );
    assert_eq!(deployment.spec.as_ref().and_then(|s| s.replicas), Some(1));
}

#[test]
fn mandatory_flags_precede_optional_flags() {
    let args = container_args(&fresh(&all_options()));
    let mandatory = AutoscalerArgs::mandatory().to_args();
    assert_eq!(&args[..mandatory.len()], &mandatory[..]);
    let optional: Vec<&str> = args[mandatory.len()..]
        .iter()
        .map(|a| {
            a.trim_start_matches("--")
                .split('=')
                .next()
                .unwrap_or_default()
        })
        .collect();
    assert_eq!(optional, OPTIONAL_FLAGS);
}

#[test]
fn role_and_binding_wire_up_the_service_account() {
    let hcp = hosted_control_plane();
    let owner = OwnerRef::from_hosted_control_plane(&hcp).unwrap();

    let mut role = Role {
        metadata: meta("autoscaler-role", "clusters-demo"),
        ..Default::default()
    };
    reconcile_autoscaler_role(&mut role, &owner).unwrap();

    let resources = role.rules.as_ref().unwrap()[0].resources.clone().unwrap();
    assert_eq!(resources, MACHINE_RESOURCES.map(String::from).to_vec());

    let mut binding = RoleBinding {
        metadata: meta("autoscaler-role-binding", "clusters-demo"),
        ..Default::default()
    };
    let sa = ServiceAccount {
        metadata: meta("sa-x", "ns-y"),
        ..Default::default()
    };
    reconcile_autoscaler_role_binding(&mut binding, &role, &sa, &owner).unwrap();

    assert_eq!(binding.role_ref.name, "autoscaler-role");
    assert_eq!(binding.role_ref.kind, "Role");
    let subjects = binding.subjects.as_ref().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0].kind, "ServiceAccount");
    assert_eq!(subjects[0].name, "sa-x");
    assert_eq!(subjects[0].namespace.as_deref(), Some("ns-y"));
}

#[test]
fn binding_survives_role_recreation() {
    let owner = OwnerRef::from_hosted_control_plane(&hosted_control_plane()).unwrap();
    let sa = service_account();

    let mut original = Role {
        metadata: meta("cluster-autoscaler", "clusters-demo"),
        ..Default::default()
    };
    original.metadata.uid = Some("first".to_string());
    let mut recreated = original.clone();
    recreated.metadata.uid = Some("second".to_string());

    let mut before = RoleBinding::default();
    reconcile_autoscaler_role_binding(&mut before, &original, &sa, &owner).unwrap();
    let mut after = before.clone();
    reconcile_autoscaler_role_binding(&mut after, &recreated, &sa, &owner).unwrap();
    assert_eq!(before, after);
}

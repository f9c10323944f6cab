//! Deployment-level policy shared by control plane components
//!
//! Component reconcilers build their own pod spec, then describe the
//! cluster-wide policy (replicas, priority, placement, provenance) with a
//! [`DeploymentConfig`] and apply it last. Applying is idempotent: labels and
//! annotations are overwritten by key, tolerations are added once.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    Affinity, NodeAffinity, NodeSelectorRequirement, NodeSelectorTerm, PodAffinity,
    PodAffinityTerm, PodSecurityContext, PreferredSchedulingTerm, Toleration,
    WeightedPodAffinityTerm,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use crate::config::{
    CLUSTER_NODE_LABEL, CONTROL_PLANE_NODE_LABEL, DEFAULT_SECURITY_CONTEXT_USER,
    HOSTED_CONTROL_PLANE_LABEL, HOSTNAME_TOPOLOGY_KEY, RELEASE_IMAGE_ANNOTATION,
    RESTART_DATE_ANNOTATION,
};

/// Pod placement policy
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scheduling {
    /// Priority class for the pods
    pub priority_class: Option<String>,
    /// Tolerations added to the pod spec
    pub tolerations: Vec<Toleration>,
    /// Preferred node affinity terms
    pub node_affinity: Vec<PreferredSchedulingTerm>,
    /// Preferred pod affinity terms
    pub pod_affinity: Vec<WeightedPodAffinityTerm>,
}

/// Declarative deployment policy applied after a component builds its spec
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeploymentConfig {
    /// Desired replica count
    pub replicas: i32,
    /// Placement policy
    pub scheduling: Scheduling,
    /// Set a non-root pod security context
    pub set_default_security_context: bool,
    /// Labels merged into the pod template
    pub labels: BTreeMap<String, String>,
    /// Annotations merged into the pod template
    pub annotations: BTreeMap<String, String>,
}

impl DeploymentConfig {
    /// Record the release image the workload was rendered from
    pub fn set_release_image_annotation(&mut self, release_image: &str) {
        if !release_image.is_empty() {
            self.annotations.insert(
                RELEASE_IMAGE_ANNOTATION.to_string(),
                release_image.to_string(),
            );
        }
    }

    /// Carry the descriptor's restart annotation into the pod template.
    ///
    /// Bumping the annotation on the HostedControlPlane rolls every component.
    pub fn set_restart_annotation(&mut self, meta: &ObjectMeta) {
        if let Some(value) = meta
            .annotations
            .as_ref()
            .and_then(|a| a.get(RESTART_DATE_ANNOTATION))
        {
            self.annotations
                .insert(RESTART_DATE_ANNOTATION.to_string(), value.clone());
        }
    }

    /// Prefer scheduling next to the other pods of the control plane in `namespace`
    pub fn set_colocation(&mut self, namespace: &str) {
        self.labels
            .insert(HOSTED_CONTROL_PLANE_LABEL.to_string(), namespace.to_string());
        self.scheduling.pod_affinity = vec![WeightedPodAffinityTerm {
            weight: 100,
            pod_affinity_term: PodAffinityTerm {
                label_selector: Some(LabelSelector {
                    match_labels: Some(BTreeMap::from([(
                        HOSTED_CONTROL_PLANE_LABEL.to_string(),
                        namespace.to_string(),
                    )])),
                    ..Default::default()
                }),
                topology_key: HOSTNAME_TOPOLOGY_KEY.to_string(),
                ..Default::default()
            },
        }];
    }

    /// Keep the pods on nodes reserved for this control plane, away from tenant workloads
    pub fn set_control_plane_isolation(&mut self, namespace: &str) {
        self.scheduling.tolerations = vec![
            no_schedule_toleration(CONTROL_PLANE_NODE_LABEL, "true"),
            no_schedule_toleration(CLUSTER_NODE_LABEL, namespace),
        ];
        self.scheduling.node_affinity = vec![
            preferred_node_label(50, CONTROL_PLANE_NODE_LABEL, "true"),
            preferred_node_label(100, CLUSTER_NODE_LABEL, namespace),
        ];
    }

    /// Apply the policy to a deployment
    pub fn apply_to(&self, deployment: &mut Deployment) {
        let spec = deployment.spec.get_or_insert_with(Default::default);
        spec.replicas = Some(self.replicas);

        let template_meta = spec.template.metadata.get_or_insert_with(Default::default);
        if !self.labels.is_empty() {
            template_meta
                .labels
                .get_or_insert_with(BTreeMap::new)
                .extend(self.labels.clone());
        }
        if !self.annotations.is_empty() {
            template_meta
                .annotations
                .get_or_insert_with(BTreeMap::new)
                .extend(self.annotations.clone());
        }

        let pod_spec = spec.template.spec.get_or_insert_with(Default::default);
        if let Some(priority_class) = &self.scheduling.priority_class {
            pod_spec.priority_class_name = Some(priority_class.clone());
        }

        if !self.scheduling.tolerations.is_empty() {
            let tolerations = pod_spec.tolerations.get_or_insert_with(Vec::new);
            for toleration in &self.scheduling.tolerations {
                if !tolerations.contains(toleration) {
                    tolerations.push(toleration.clone());
                }
            }
        }

        if !self.scheduling.node_affinity.is_empty() || !self.scheduling.pod_affinity.is_empty() {
            let affinity = pod_spec.affinity.get_or_insert_with(Affinity::default);
            if !self.scheduling.node_affinity.is_empty() {
                affinity.node_affinity = Some(NodeAffinity {
                    preferred_during_scheduling_ignored_during_execution: Some(
                        self.scheduling.node_affinity.clone(),
                    ),
                    ..Default::default()
                });
            }
            if !self.scheduling.pod_affinity.is_empty() {
                affinity.pod_affinity = Some(PodAffinity {
                    preferred_during_scheduling_ignored_during_execution: Some(
                        self.scheduling.pod_affinity.clone(),
                    ),
                    ..Default::default()
                });
            }
        }

        if self.set_default_security_context {
            pod_spec
                .security_context
                .get_or_insert_with(PodSecurityContext::default)
                .run_as_user = Some(DEFAULT_SECURITY_CONTEXT_USER);
        }
    }
}

fn no_schedule_toleration(key: &str, value: &str) -> Toleration {
    Toleration {
        key: Some(key.to_string()),
        operator: Some("Equal".to_string()),
        value: Some(value.to_string()),
        effect: Some("NoSchedule".to_string()),
        ..Default::default()
    }
}

fn preferred_node_label(weight: i32, key: &str, value: &str) -> PreferredSchedulingTerm {
    PreferredSchedulingTerm {
        weight,
        preference: NodeSelectorTerm {
            match_expressions: Some(vec![NodeSelectorRequirement {
                key: key.to_string(),
                operator: "In".to_string(),
                values: Some(vec![value.to_string()]),
            }]),
            ..Default::default()
        },
    }
}

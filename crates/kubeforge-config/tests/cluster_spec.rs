use indoc::indoc;
use kubeforge_config::ClusterSpec;

#[test]
fn empty_document_defaults_to_a_valid_cluster() {
    let mut spec: ClusterSpec = serde_yaml::from_str("{}").expect("valid yaml");
    spec.apply_defaults();

    let kubernetes = spec.kubernetes.as_ref().expect("kubernetes section");
    assert_eq!(kubernetes.version.as_deref(), Some("v1.28.2"));

    let runtime = spec.runtime.as_ref().expect("runtime section");
    assert_eq!(runtime.runtime_type.as_deref(), Some("containerd"));
    assert!(runtime.containerd.is_some());
    assert!(runtime.docker.is_none());

    let network = spec.network.as_ref().expect("network section");
    assert_eq!(network.plugin.as_deref(), Some("calico"));
    assert_eq!(network.pods_cidr.as_deref(), Some("10.233.64.0/18"));

    let errors = spec.validate("spec");
    assert!(errors.is_empty(), "unexpected errors:\n{errors}");
}

#[test]
fn defaulting_a_parsed_document_is_idempotent() {
    let input = indoc! {"
        kubernetes:
          version: v1.27.4
        runtime:
          type: crio
        storage:
          type: nfsClient
          nfsClient:
            server: nfs.internal
            path: /exports/k8s
    "};

    let mut spec: ClusterSpec = serde_yaml::from_str(input).expect("valid yaml");
    spec.apply_defaults();

    let defaulted_once = spec.clone();
    spec.apply_defaults();
    assert_eq!(spec, defaulted_once);

    let errors = spec.validate("spec");
    assert!(errors.is_empty(), "unexpected errors:\n{errors}");
}

#[test]
fn populated_inactive_runtime_variant_is_the_only_error() {
    let input = indoc! {"
        runtime:
          type: docker
          containerd:
            dataRoot: /var/lib/containerd
    "};

    let mut spec: ClusterSpec = serde_yaml::from_str(input).expect("valid yaml");
    spec.apply_defaults();

    let errors = spec.validate("spec");
    assert_eq!(errors.len(), 1, "unexpected errors:\n{errors}");

    let error = errors.iter().next().expect("one error");
    assert_eq!(error.path, "spec.runtime.containerd");
    assert!(error.message.contains("must not be set when type is 'docker'"));
    assert!(error.message.contains("can only be set if type is 'containerd'"));
}

#[test]
fn every_defect_is_reported_in_document_order() {
    let input = indoc! {r#"
        kubernetes:
          version: not-a-version
          maxPods: 1000
        runtime:
          type: containerd
          containerd:
            insecureRegistries:
              - "registry.local:5000"
              - "bad registry"
        network:
          podsCidr: 10.233.64.0/33
        controlPlaneEndpoint:
          address: 999.0.0.1
        storage:
          type: nfsClient
        system:
          ntpServers:
            - pool.ntp.org
            - "not a host"
    "#};

    let mut spec: ClusterSpec = serde_yaml::from_str(input).expect("valid yaml");
    spec.apply_defaults();

    let errors = spec.validate("spec");
    let paths = errors
        .iter()
        .map(|error| error.path.as_str())
        .collect::<Vec<_>>();
    assert_eq!(paths, [
        "spec.kubernetes.version",
        "spec.kubernetes.maxPods",
        "spec.runtime.containerd.insecureRegistries[1]",
        "spec.network.podsCidr",
        "spec.controlPlaneEndpoint.address",
        "spec.storage.nfsClient.server",
        "spec.storage.nfsClient.path",
        "spec.system.ntpServers[1]",
    ]);
}

#[test]
fn unknown_discriminator_suppresses_variant_checks() {
    let input = indoc! {"
        runtime:
          type: rkt
          docker:
            dataRoot: /var/lib/docker
    "};

    let mut spec: ClusterSpec = serde_yaml::from_str(input).expect("valid yaml");
    spec.apply_defaults();

    let errors = spec.validate("spec");
    assert_eq!(errors.len(), 1, "unexpected errors:\n{errors}");

    let error = errors.iter().next().expect("one error");
    assert_eq!(error.path, "spec.runtime.type");
    assert_eq!(
        error.message,
        "\"rkt\" is not one of [docker, containerd, crio, isula]"
    );
}

#[test]
fn validating_without_defaulting_reports_every_missing_section() {
    let spec: ClusterSpec = serde_yaml::from_str("{}").expect("valid yaml");
    let errors = spec.validate("spec");

    assert_eq!(errors.len(), 7);
    for error in &errors {
        assert_eq!(error.message, "section is required");
    }
}

#[test]
fn defaulted_spec_serializes_without_nulls() {
    let mut spec: ClusterSpec = serde_yaml::from_str("{}").expect("valid yaml");
    spec.apply_defaults();

    let rendered = serde_yaml::to_string(&spec).expect("serializable spec");
    assert!(!rendered.contains("null"), "unexpected nulls:\n{rendered}");

    let reparsed: ClusterSpec = serde_yaml::from_str(&rendered).expect("round-trips");
    assert_eq!(reparsed, spec);
}

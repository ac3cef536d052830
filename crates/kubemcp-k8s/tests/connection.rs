mod common;

use std::io::Write as _;

use common::MockCluster;
use kubemcp_k8s::config::{ConnectionEnv, resolve_config};
use kubemcp_k8s::KubeClient;

#[tokio::test]
async fn inline_kubeconfig_data_connects() {
    let cluster = MockCluster::start().await;
    let kubeconfig_yaml = serde_yaml::to_string(&cluster.kubeconfig()).expect("serialize");

    let env = ConnectionEnv {
        kubeconfig_data: Some(kubeconfig_yaml),
        ..Default::default()
    };
    let config = resolve_config(&env, None).await.expect("resolve");
    let kube = KubeClient::with_client(kube::Client::try_from(config).expect("client"));

    // A successful discovery walk proves the connection works end to end.
    let coordinate = kube.resolve_kind("Pod").await.expect("resolve Pod");
    assert_eq!(coordinate.resource.plural, "pods");
}

#[tokio::test]
async fn explicit_kubeconfig_file_connects() {
    let cluster = MockCluster::start().await;
    let kubeconfig_yaml = serde_yaml::to_string(&cluster.kubeconfig()).expect("serialize");

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(kubeconfig_yaml.as_bytes()).expect("write");
    file.flush().expect("flush");

    let env = ConnectionEnv::default();
    let config = resolve_config(&env, Some(file.path())).await.expect("resolve");
    let kube = KubeClient::with_client(kube::Client::try_from(config).expect("client"));

    let resources = kube.api_resources(true, true).await.expect("discovery");
    assert!(resources.iter().any(|r| r.kind == "Deployment"));
}

#[tokio::test]
async fn server_and_token_connect_directly() {
    let cluster = MockCluster::start().await;

    let env = ConnectionEnv {
        server: Some(cluster.uri()),
        token: Some("test-token".to_string()),
        insecure: true,
        ..Default::default()
    };
    let config = resolve_config(&env, None).await.expect("resolve");
    let kube = KubeClient::with_client(kube::Client::try_from(config).expect("client"));

    let coordinate = kube.resolve_kind("Widget").await.expect("resolve Widget");
    assert_eq!(coordinate.resource.group, "example.com");
}

//! Provider construction from configuration.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use vcloud_provider::{
    CacheConfig, Config, InstanceRecord, InstanceResolver, Node, PROVIDER_NAME, Result, VCloud,
    VCloudConfig, VCloudError,
};

fn valid() -> VCloudConfig {
    VCloudConfig {
        cluster_id: "d73c6df2-f7fe-4f7c-bf70-9f94cce26430".into(),
        cluster_name: "test-cluster".into(),
        mgmt_url: "https://api.vcloud.example.com".into(),
        provider_token: Some("token".into()),
    }
}

struct StaticResolver;

#[async_trait]
impl InstanceResolver for StaticResolver {
    async fn resolve(&self, id: &str) -> Result<InstanceRecord> {
        Ok(InstanceRecord {
            exists: true,
            shutdown: true,
            provider_id: id.to_string(),
            ..Default::default()
        })
    }
}

#[test]
fn build_from_valid_config() {
    let provider = VCloud::builder().config(valid()).build().unwrap();
    assert_eq!(provider.provider_name(), PROVIDER_NAME);
    assert_eq!(provider.provider_name(), "vcloud");
    assert!(provider.has_cluster_id());
    assert_eq!(provider.cluster_name(), "test-cluster");
    assert_eq!(
        provider.client().base_url(),
        "https://api.vcloud.example.com/clusters/d73c6df2-f7fe-4f7c-bf70-9f94cce26430"
    );
    assert!(provider.cache().is_empty());
}

#[test]
fn build_without_config_fails() {
    let err = VCloud::builder().build().unwrap_err();
    assert!(matches!(err, VCloudError::Configuration(_)));
}

#[test]
fn build_rejects_invalid_config() {
    let mut cfg = valid();
    cfg.cluster_id = "not-a-uuid".into();
    let err = VCloud::builder().config(cfg).build().unwrap_err();
    assert!(err.to_string().contains("UUID"));
}

#[test]
fn cache_config_is_applied() {
    let provider = VCloud::builder()
        .config(valid())
        .cache_config(
            CacheConfig::new()
                .present_ttl(Duration::from_secs(90))
                .single_flight(true),
        )
        .build()
        .unwrap();
    assert_eq!(provider.cache().config().present_ttl, Duration::from_secs(90));
    assert!(provider.cache().config().single_flight);
}

#[test]
fn build_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[vcloud]
cluster_id = "d73c6df2-f7fe-4f7c-bf70-9f94cce26430"
cluster_name = "from-file"
mgmt_url = "https://api.vcloud.example.com/"
provider_token = "secret"

[cache]
absent_ttl_secs = 2
"#
    )
    .unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    let provider = VCloud::builder().from_config(config).build().unwrap();
    assert_eq!(provider.cluster_name(), "from-file");
    assert_eq!(provider.cache().config().absent_ttl, Duration::from_secs(2));
    assert_eq!(provider.cache().config().present_ttl, Duration::from_secs(30));
}

#[tokio::test]
async fn from_config_chains_with_other_builder_calls() {
    let config = Config::from_toml_str(
        r#"
[vcloud]
cluster_id = "d73c6df2-f7fe-4f7c-bf70-9f94cce26430"
cluster_name = "chained"
mgmt_url = "https://api.vcloud.example.com"
provider_token = "secret"

[cache]
single_flight = true
"#,
    )
    .unwrap();

    let provider = VCloud::builder()
        .resolver(Arc::new(StaticResolver))
        .from_config(config)
        .build()
        .unwrap();
    assert_eq!(provider.cluster_name(), "chained");
    assert!(provider.cache().config().single_flight);

    let node = Node::new("n").with_provider_id("i-7");
    assert!(provider.instances().instance_exists(&node).await.unwrap());
}

#[tokio::test]
async fn custom_resolver_feeds_the_instances_contract() {
    let provider = VCloud::builder()
        .config(valid())
        .resolver(Arc::new(StaticResolver))
        .build()
        .unwrap();

    let node = Node::new("n").with_provider_id("vcloud://i-42");
    let instances = provider.instances();
    assert!(instances.instance_exists(&node).await.unwrap());
    assert!(instances.instance_shutdown(&node).await.unwrap());
    assert_eq!(provider.cache().len(), 1);
    assert!(provider.cache().peek("i-42").is_some());
}

#[test]
fn debug_output_hides_token() {
    let mut cfg = valid();
    cfg.provider_token = Some("super-secret".into());
    let provider = VCloud::builder().config(cfg).build().unwrap();
    assert!(!format!("{provider:?}").contains("super-secret"));
}

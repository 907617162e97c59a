use std::path::{Path, PathBuf};

use layer_publisher_core::build_plan::{filter_lines, generate_lines, RunnerShard};
use layer_publisher_core::contract::{write_json_pretty, write_text, BuildConfig, LayerDefinition};
use layer_publisher_core::description::calc_description_data;
use layer_publisher_core::naming::bucket_name;
use layer_publisher_core::state::StateUpdate;
use layer_publisher_core::template::{
    calc_architectures, filter_runtimes, render_deploy_script, render_template, DEPLOY_SCRIPT_FILE,
    TEMPLATE_FILE,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::adapters::account::AccountResolver;
use crate::adapters::artifact_bucket::{ArtifactBucket, BucketCreation};
use crate::adapters::state_store::StateStore;

use super::HandlerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeforePublishConfig {
    pub region: String,
    pub layer_info_path: PathBuf,
    pub build_config_path: PathBuf,
    pub output_dir: PathBuf,
    pub layer_name_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDeployment {
    pub bucket_name: String,
    pub bucket: BucketCreation,
    pub template_path: PathBuf,
    pub script_path: PathBuf,
}

/// Marks the layer deploying and saves the returned record as the layer
/// definition consumed by the build and template steps.
pub fn start_publish(
    store: &impl StateStore,
    identifier: &str,
    timestamp: &str,
    actions_url: &str,
    layer_info_path: &Path,
) -> Result<LayerDefinition, HandlerError> {
    let record = store
        .update_state(identifier, &StateUpdate::start_publish(timestamp, actions_url))
        .map_err(HandlerError::Adapter)?;

    let record = Value::Object(record);
    write_json_pretty(layer_info_path, &record)?;

    let layer: LayerDefinition = serde_json::from_value(record)
        .map_err(|error| layer_publisher_core::Error::json(layer_info_path, error))?;
    info!(
        identifier,
        packages = layer.packages.len(),
        split = layer.is_architecture_split,
        path = %layer_info_path.display(),
        "publish started"
    );
    Ok(layer)
}

/// Writes this runner's share of the build matrix as a shell script.
pub fn build_install_script(
    layer_info_path: &Path,
    build_config_path: &Path,
    shard: &RunnerShard,
    script_path: &Path,
) -> Result<Vec<String>, HandlerError> {
    let layer = LayerDefinition::load(layer_info_path)?;
    let config = BuildConfig::load(build_config_path)?;

    let base_lines = generate_lines(&layer, &config.runtimes);
    let lines = filter_lines(&base_lines, shard, layer.is_architecture_split)?;
    write_text(script_path, &lines.join("\n"))?;

    info!(
        identifier = %layer.identifier,
        runner = %shard.runner_name,
        concurrency_index = shard.concurrency_index,
        max_concurrency = shard.max_concurrency,
        builds = lines.len(),
        path = %script_path.display(),
        "wrote install script"
    );
    Ok(lines)
}

pub fn before_publish(
    account: &impl AccountResolver,
    bucket: &impl ArtifactBucket,
    config: &BeforePublishConfig,
) -> Result<PreparedDeployment, HandlerError> {
    let account_id = account.account_id().map_err(HandlerError::Adapter)?;
    let bucket_name = bucket_name(&account_id, &config.region);
    let creation = bucket
        .create_bucket(&bucket_name, &config.region)
        .map_err(HandlerError::Adapter)?;
    info!(bucket = %bucket_name, ?creation, "deployment bucket ready");

    let layer = LayerDefinition::load(&config.layer_info_path)?;
    let build_config = BuildConfig::load(&config.build_config_path)?;
    let runtimes = filter_runtimes(&build_config.runtimes, layer.ignore_versions());
    let description = calc_description_data(&layer);
    let template = render_template(
        &calc_architectures(layer.is_architecture_split),
        &runtimes,
        &description,
        &config.layer_name_prefix,
    );

    let template_path = config.output_dir.join(TEMPLATE_FILE);
    write_text(&template_path, &template)?;
    let script_path = config.output_dir.join(DEPLOY_SCRIPT_FILE);
    write_text(
        &script_path,
        &render_deploy_script(&bucket_name, &description.identifier),
    )?;

    info!(
        identifier = %description.identifier,
        hash = %description.hash,
        runtimes = runtimes.len(),
        template = %template_path.display(),
        "rendered deployment template"
    );
    Ok(PreparedDeployment {
        bucket_name,
        bucket: creation,
        template_path,
        script_path,
    })
}

pub fn after_publish(
    account: &impl AccountResolver,
    bucket: &impl ArtifactBucket,
    region: &str,
) -> Result<String, HandlerError> {
    let account_id = account.account_id().map_err(HandlerError::Adapter)?;
    let bucket_name = bucket_name(&account_id, region);
    let deleted = bucket
        .delete_bucket(&bucket_name)
        .map_err(HandlerError::Adapter)?;
    info!(bucket = %bucket_name, deleted_objects = deleted, "deployment bucket removed");
    Ok(bucket_name)
}

pub fn finish_publish(
    store: &impl StateStore,
    identifier: &str,
    timestamp: &str,
) -> Result<Map<String, Value>, HandlerError> {
    let record = store
        .update_state(identifier, &StateUpdate::finish_publish(timestamp))
        .map_err(HandlerError::Adapter)?;
    info!(identifier, state = "PUBLISHED", record = %serde_json::Value::Object(record.clone()), "updated item");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use layer_publisher_core::state::{ATTR_ACTIONS_PUBLISH_URL, ATTR_STATE_LAYER};
    use layer_publisher_core::template::DEFAULT_LAYER_NAME_PREFIX;
    use serde_json::json;

    use super::*;
    use crate::handlers::testing::{
        BucketCall, FailingStateStore, FixedAccount, RecordingBucket, RecordingStateStore,
    };

    const TS: &str = "2025-06-01T09:00:00.000000+09:00";
    const RUN_URL: &str = "https://github.com/o/r/actions/runs/42";

    fn seeded_store() -> RecordingStateStore {
        RecordingStateStore::with_record(
            "aws-cloudwatch-logs-url",
            json!({
                "packages": ["aws-cloudwatch-logs-url==1.0.3"],
                "isArchitectureSplit": false,
                "stateLayer": "QUEUED",
                "note": "Generate AWS CloudWatch Logs URL"
            }),
        )
    }

    fn write_inputs(dir: &Path, layer: Value) -> (PathBuf, PathBuf) {
        let layer_path = dir.join("layer.json");
        let build_config_path = dir.join("build_config.json");
        write_json_pretty(&layer_path, &layer).expect("write layer");
        write_json_pretty(
            &build_config_path,
            &json!({"runtimes": ["python3.13", "python3.12"]}),
        )
        .expect("write build config");
        (layer_path, build_config_path)
    }

    #[test]
    fn start_publish_saves_updated_record_as_layer_definition() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layer_path = dir.path().join("layer.json");
        let store = seeded_store();

        let layer = start_publish(&store, "aws-cloudwatch-logs-url", TS, RUN_URL, &layer_path)
            .expect("start publish should pass");

        assert_eq!(layer.identifier, "aws-cloudwatch-logs-url");
        assert_eq!(layer.note.as_deref(), Some("Generate AWS CloudWatch Logs URL"));
        let saved: Value =
            layer_publisher_core::contract::read_json(&layer_path).expect("layer file");
        assert_eq!(saved[ATTR_STATE_LAYER], "DEPLOYING");
        assert_eq!(saved[ATTR_ACTIONS_PUBLISH_URL], RUN_URL);
        assert_eq!(LayerDefinition::load(&layer_path).expect("reload"), layer);
    }

    #[test]
    fn start_publish_rejects_record_without_packages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = RecordingStateStore::new();

        let error = start_publish(&store, "unknown", TS, RUN_URL, &dir.path().join("layer.json"))
            .expect_err("record without packages should fail");

        assert!(error.to_string().contains("layer.json"), "{error}");
    }

    #[test]
    fn store_errors_surface_unchanged() {
        let error = finish_publish(&FailingStateStore, "zstd", TS).expect_err("should fail");
        assert_eq!(error.to_string(), "ResourceNotFoundException: table missing");
    }

    #[test]
    fn build_writes_only_this_runners_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (layer_path, build_config_path) = write_inputs(
            dir.path(),
            json!({"identifier": "numpy", "packages": ["numpy==2.2.6"], "isArchitectureSplit": true}),
        );
        let script_path = dir.path().join("out").join("install.sh");
        let shard = RunnerShard {
            runner_name: "ubuntu-24.04-arm".to_string(),
            max_concurrency: 2,
            concurrency_index: 1,
        };

        let lines = build_install_script(&layer_path, &build_config_path, &shard, &script_path)
            .expect("build should pass");

        assert_eq!(
            lines,
            vec!["./build.sh --packages numpy==2.2.6 --arch arm --runtime python3.12".to_string()]
        );
        assert_eq!(
            std::fs::read_to_string(&script_path).expect("script"),
            lines.join("\n")
        );
    }

    #[test]
    fn build_rejects_out_of_range_concurrency_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (layer_path, build_config_path) = write_inputs(
            dir.path(),
            json!({"identifier": "numpy", "packages": ["numpy==2.2.6"]}),
        );
        let shard = RunnerShard {
            runner_name: "ubuntu-24.04".to_string(),
            max_concurrency: 2,
            concurrency_index: 2,
        };

        let error = build_install_script(
            &layer_path,
            &build_config_path,
            &shard,
            &dir.path().join("install.sh"),
        )
        .expect_err("index should be rejected");

        assert!(matches!(error, HandlerError::Validation(_)));
        assert!(!dir.path().join("install.sh").exists());
    }

    #[test]
    fn before_publish_creates_bucket_and_renders_template() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (layer_path, build_config_path) = write_inputs(
            dir.path(),
            json!({
                "identifier": "aws-cloudwatch-logs-url",
                "packages": ["aws-cloudwatch-logs-url==1.0.3"],
                "ignoreVersions": ["python3.12"]
            }),
        );
        let bucket = RecordingBucket::new(BucketCreation::AlreadyExists);
        let config = BeforePublishConfig {
            region: "ap-northeast-1".to_string(),
            layer_info_path: layer_path,
            build_config_path,
            output_dir: dir.path().join("deploy"),
            layer_name_prefix: DEFAULT_LAYER_NAME_PREFIX.to_string(),
        };

        let prepared = before_publish(&FixedAccount("123456789012"), &bucket, &config)
            .expect("before publish should pass");

        assert_eq!(prepared.bucket_name, "layer-publisher-123456789012-ap-northeast-1");
        assert_eq!(prepared.bucket, BucketCreation::AlreadyExists);
        assert_eq!(
            bucket.calls(),
            vec![BucketCall::Create {
                bucket: prepared.bucket_name.clone(),
                region: "ap-northeast-1".to_string(),
            }]
        );

        let template = std::fs::read_to_string(&prepared.template_path).expect("template");
        assert!(template.contains("python3.13"));
        assert!(!template.contains("python3.12"));
        assert!(template.contains("c16ed0728d85b2c89896f7ab9322391a3535b22c43f01399790223f8"));

        let script = std::fs::read_to_string(&prepared.script_path).expect("script");
        assert!(script.contains(&prepared.bucket_name));
    }

    #[test]
    fn after_publish_deletes_the_region_bucket() {
        let bucket = RecordingBucket::new(BucketCreation::Created);

        let name = after_publish(&FixedAccount("123456789012"), &bucket, "us-east-1")
            .expect("after publish should pass");

        assert_eq!(name, "layer-publisher-123456789012-us-east-1");
        assert_eq!(bucket.calls(), vec![BucketCall::Delete { bucket: name }]);
    }

    #[test]
    fn finish_publish_records_publication_time() {
        let store = seeded_store();

        let record = finish_publish(&store, "aws-cloudwatch-logs-url", TS).expect("finish");

        assert_eq!(record["stateLayer"], "PUBLISHED");
        assert_eq!(record["lastPublishedAt"], TS);
        assert_eq!(store.updates().len(), 1);
    }
}

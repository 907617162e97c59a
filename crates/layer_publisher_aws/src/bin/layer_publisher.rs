use anyhow::{Context, Result};
use clap::Parser;
use layer_publisher_aws::aws::dynamodb::DynamoStateStore;
use layer_publisher_aws::aws::eventbridge::EventBridgePublisher;
use layer_publisher_aws::aws::lambda::LambdaLayerRegistry;
use layer_publisher_aws::aws::s3::S3ArtifactBucket;
use layer_publisher_aws::aws::sts::StsAccountResolver;
use layer_publisher_aws::cli::{Cli, Commands, LogFormat, StateArgs};
use layer_publisher_aws::handlers::publish::BeforePublishConfig;
use layer_publisher_aws::handlers::{failure, fetch, generate, publish};
use layer_publisher_core::notification::RetryPolicy;
use layer_publisher_core::state::{parse_timezone, timestamp_in};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn timestamp(state: &StateArgs) -> Result<String> {
    let timezone = parse_timezone(&state.timezone)?;
    Ok(timestamp_in(timezone))
}

fn sdk_region(config: &aws_config::SdkConfig) -> Result<String> {
    config
        .region()
        .map(|region| region.as_ref().to_string())
        .context("no AWS region configured; pass --region or set AWS_REGION")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = cli.command.region() {
        loader = loader.region(aws_config::Region::new(region.to_string()));
    }
    let sdk_config = loader.load().await;

    match cli.command {
        Commands::FetchLayers { output_dir, .. } => {
            let region = sdk_region(&sdk_config)?;
            let registry = LambdaLayerRegistry::new(&sdk_config);
            let (path, _) = fetch::fetch_layers(&registry, &region, &output_dir)?;
            info!(path = %path.display(), "fetch complete");
        }
        Commands::StartGenerate(state) => {
            let store = DynamoStateStore::new(&sdk_config, &state.table_name);
            generate::start_generate(&store, &state.identifier, &timestamp(&state)?)?;
        }
        Commands::CompleteGenerate { state, aggregate } => {
            let store = DynamoStateStore::new(&sdk_config, &state.table_name);
            generate::complete_generate(
                &store,
                &state.identifier,
                &timestamp(&state)?,
                &aggregate.config(),
            )?;
        }
        Commands::StartPublish {
            state,
            actions_url,
            layer_info,
        } => {
            let store = DynamoStateStore::new(&sdk_config, &state.table_name);
            publish::start_publish(
                &store,
                &state.identifier,
                &timestamp(&state)?,
                &actions_url,
                &layer_info,
            )?;
        }
        Commands::Build(args) => {
            publish::build_install_script(
                &args.layer_info,
                &args.build_config,
                &args.shard(),
                &args.output,
            )?;
        }
        Commands::BeforePublish {
            layer_info,
            build_config,
            output_dir,
            layer_name_prefix,
            ..
        } => {
            let config = BeforePublishConfig {
                region: sdk_region(&sdk_config)?,
                layer_info_path: layer_info,
                build_config_path: build_config,
                output_dir,
                layer_name_prefix,
            };
            let prepared = publish::before_publish(
                &StsAccountResolver::new(&sdk_config),
                &S3ArtifactBucket::new(&sdk_config),
                &config,
            )?;
            info!(bucket = %prepared.bucket_name, "before publish complete");
        }
        Commands::AfterPublish { .. } => {
            publish::after_publish(
                &StsAccountResolver::new(&sdk_config),
                &S3ArtifactBucket::new(&sdk_config),
                &sdk_region(&sdk_config)?,
            )?;
        }
        Commands::FinishPublish(state) => {
            let store = DynamoStateStore::new(&sdk_config, &state.table_name);
            publish::finish_publish(&store, &state.identifier, &timestamp(&state)?)?;
        }
        Commands::SetFailed {
            state,
            stage,
            actions_url,
            event_bus,
        } => {
            let store = DynamoStateStore::new(&sdk_config, &state.table_name);
            let publisher = EventBridgePublisher::new(&sdk_config, event_bus);
            failure::set_failed(
                &store,
                &publisher,
                &state.identifier,
                stage.into(),
                &timestamp(&state)?,
                &actions_url,
                RetryPolicy::default(),
            )?;
        }
    }

    Ok(())
}

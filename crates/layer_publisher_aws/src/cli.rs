//! Command-line surface of the `layer-publisher` binary.
//!
//! Each subcommand is one CI step. Flags fall back to the environment the
//! workflow exports:
//!
//! - `TABLE_NAME`, `IDENTIFIER`, `STATE_TIMEZONE` for state updates
//! - `URL_ACTION_RUN` for the run link recorded on the item
//! - `MY_RUNNER_NAME`, `MAX_CONCURRENCY`, `CONCURRENCY_INDEX` for build sharding
//! - `EVENT_BUS_NAME` for failure notifications
//! - `AWS_REGION` for region-scoped steps
//! - `LOG_FORMAT` for log output

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use layer_publisher_core::build_plan::RunnerShard;
use layer_publisher_core::contract::{
    DEFAULT_BUILD_CONFIG_FILE, DEFAULT_INSTALL_SCRIPT_FILE, DEFAULT_LAYER_INFO_FILE,
    DEFAULT_SOURCE_DATA_FILE,
};
use layer_publisher_core::state::{Stage, DEFAULT_TIMEZONE};
use layer_publisher_core::template::DEFAULT_LAYER_NAME_PREFIX;

use crate::handlers::fetch::DEFAULT_DUMP_DIR;
use crate::handlers::generate::AggregateConfig;

pub const DEFAULT_LAYERS_DIR: &str = "layers";
pub const DEFAULT_EVENT_BUS: &str = "default";

#[derive(Debug, Parser)]
#[command(name = "layer-publisher")]
#[command(author, version, about = "CI steps for publishing public Lambda layers", long_about = None)]
pub struct Cli {
    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Dump every layer version in the region.
    FetchLayers {
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,

        #[arg(long, default_value = DEFAULT_DUMP_DIR)]
        output_dir: PathBuf,
    },
    /// Mark catalog generation as deploying.
    StartGenerate(StateArgs),
    /// Aggregate region dumps into source data and mark generation published.
    CompleteGenerate {
        #[command(flatten)]
        state: StateArgs,

        #[command(flatten)]
        aggregate: AggregateArgs,
    },
    /// Mark the layer as deploying and save its definition.
    StartPublish {
        #[command(flatten)]
        state: StateArgs,

        #[arg(long, env = "URL_ACTION_RUN")]
        actions_url: String,

        #[arg(long, default_value = DEFAULT_LAYER_INFO_FILE)]
        layer_info: PathBuf,
    },
    /// Write this runner's build commands.
    Build(BuildArgs),
    /// Create the deployment bucket and render the template.
    BeforePublish {
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,

        #[arg(long, default_value = DEFAULT_LAYER_INFO_FILE)]
        layer_info: PathBuf,

        #[arg(long, default_value = DEFAULT_BUILD_CONFIG_FILE)]
        build_config: PathBuf,

        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[arg(long, default_value = DEFAULT_LAYER_NAME_PREFIX)]
        layer_name_prefix: String,
    },
    /// Delete the deployment bucket.
    AfterPublish {
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,
    },
    /// Mark the layer as published.
    FinishPublish(StateArgs),
    /// Mark a stage failed and send a notification.
    SetFailed {
        #[command(flatten)]
        state: StateArgs,

        #[arg(long, value_enum)]
        stage: StageArg,

        #[arg(long, env = "URL_ACTION_RUN")]
        actions_url: String,

        #[arg(long, env = "EVENT_BUS_NAME", default_value = DEFAULT_EVENT_BUS)]
        event_bus: String,
    },
}

impl Commands {
    /// Region passed explicitly, overriding the SDK's default chain.
    pub fn region(&self) -> Option<&str> {
        match self {
            Self::FetchLayers { region, .. }
            | Self::BeforePublish { region, .. }
            | Self::AfterPublish { region } => region.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct StateArgs {
    /// State table name.
    #[arg(long, env = "TABLE_NAME")]
    pub table_name: String,

    /// Layer identifier (the table key).
    #[arg(long, env = "IDENTIFIER")]
    pub identifier: String,

    /// Zone used for `updatedAt` and related timestamps.
    #[arg(long, env = "STATE_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,
}

#[derive(Debug, Clone, Args)]
pub struct AggregateArgs {
    #[arg(long, default_value = DEFAULT_LAYERS_DIR)]
    pub layers_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_SOURCE_DATA_FILE)]
    pub source_data: PathBuf,

    /// Where `all_layers.json` and `single_layer.json` land.
    #[arg(long, default_value = ".")]
    pub debug_dir: PathBuf,

    /// Layer version ARNs to leave out of the catalog.
    #[arg(long = "exclude-arn", value_delimiter = ',')]
    pub excluded_arns: Vec<String>,
}

impl AggregateArgs {
    pub fn config(&self) -> AggregateConfig {
        AggregateConfig {
            layers_dir: self.layers_dir.clone(),
            source_data_path: self.source_data.clone(),
            debug_dir: self.debug_dir.clone(),
            excluded_arns: self.excluded_arns.iter().cloned().collect::<BTreeSet<_>>(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    #[arg(long, default_value = DEFAULT_LAYER_INFO_FILE)]
    pub layer_info: PathBuf,

    #[arg(long, default_value = DEFAULT_BUILD_CONFIG_FILE)]
    pub build_config: PathBuf,

    #[arg(long, default_value = DEFAULT_INSTALL_SCRIPT_FILE)]
    pub output: PathBuf,

    #[arg(long, env = "MY_RUNNER_NAME")]
    pub runner_name: String,

    #[arg(long, env = "MAX_CONCURRENCY")]
    pub max_concurrency: usize,

    #[arg(long, env = "CONCURRENCY_INDEX")]
    pub concurrency_index: usize,
}

impl BuildArgs {
    pub fn shard(&self) -> RunnerShard {
        RunnerShard {
            runner_name: self.runner_name.clone(),
            max_concurrency: self.max_concurrency,
            concurrency_index: self.concurrency_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StageArg {
    Layer,
    Generate,
}

impl From<StageArg> for Stage {
    fn from(value: StageArg) -> Self {
        match value {
            StageArg::Layer => Stage::Layer,
            StageArg::Generate => Stage::Generate,
        }
    }
}

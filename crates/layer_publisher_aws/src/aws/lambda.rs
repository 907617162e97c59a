use aws_sdk_lambda::types::LayerVersionsListItem;
use layer_publisher_core::contract::LayerVersionListing;

use crate::adapters::layer_registry::LayerRegistry;

use super::block_on;

pub struct LambdaLayerRegistry {
    client: aws_sdk_lambda::Client,
}

impl LambdaLayerRegistry {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_lambda::Client::new(config),
        }
    }
}

impl LayerRegistry for LambdaLayerRegistry {
    fn list_layer_names(&self) -> Result<Vec<String>, String> {
        block_on(async {
            let mut names = Vec::new();
            let mut pages = self.client.list_layers().into_paginator().send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|error| format!("failed to list layers: {error}"))?;
                names.extend(
                    page.layers()
                        .iter()
                        .filter_map(|layer| layer.layer_name())
                        .map(str::to_string),
                );
            }
            Ok(names)
        })
    }

    fn list_layer_versions(&self, layer_name: &str) -> Result<Vec<LayerVersionListing>, String> {
        block_on(async {
            let mut versions = Vec::new();
            let mut pages = self
                .client
                .list_layer_versions()
                .layer_name(layer_name)
                .into_paginator()
                .send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|error| {
                    format!("failed to list versions of layer {layer_name}: {error}")
                })?;
                versions.extend(page.layer_versions().iter().map(to_listing));
            }
            Ok(versions)
        })
    }
}

fn to_listing(item: &LayerVersionsListItem) -> LayerVersionListing {
    LayerVersionListing {
        layer_version_arn: item.layer_version_arn().unwrap_or_default().to_string(),
        version: item.version(),
        description: item.description().map(str::to_string),
        created_date: item.created_date().unwrap_or_default().to_string(),
        compatible_runtimes: item
            .compatible_runtimes()
            .iter()
            .map(|runtime| runtime.as_str().to_string())
            .collect(),
        license_info: item.license_info().map(str::to_string),
        compatible_architectures: item
            .compatible_architectures()
            .iter()
            .map(|architecture| architecture.as_str().to_string())
            .collect(),
    }
}

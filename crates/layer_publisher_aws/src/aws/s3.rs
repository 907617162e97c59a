use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier};

use crate::adapters::artifact_bucket::{ArtifactBucket, BucketCreation};

use super::block_on;

/// The one region where S3 rejects an explicit location constraint.
pub const DEFAULT_BUCKET_REGION: &str = "us-east-1";

pub struct S3ArtifactBucket {
    client: aws_sdk_s3::Client,
}

impl S3ArtifactBucket {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

impl ArtifactBucket for S3ArtifactBucket {
    fn create_bucket(&self, bucket_name: &str, region: &str) -> Result<BucketCreation, String> {
        let mut request = self.client.create_bucket().bucket(bucket_name);
        if region != DEFAULT_BUCKET_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match block_on(request.send()) {
            Ok(_) => Ok(BucketCreation::Created),
            Err(error) => {
                let error = error.into_service_error();
                if error.is_bucket_already_exists() || error.is_bucket_already_owned_by_you() {
                    Ok(BucketCreation::AlreadyExists)
                } else {
                    Err(format!("failed to create bucket {bucket_name}: {error}"))
                }
            }
        }
    }

    fn delete_bucket(&self, bucket_name: &str) -> Result<usize, String> {
        block_on(async {
            let mut deleted = 0usize;
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(bucket_name)
                .into_paginator()
                .send();

            while let Some(page) = pages.next().await {
                let page = page
                    .map_err(|error| format!("failed to list objects in {bucket_name}: {error}"))?;
                let objects = page
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(|key| ObjectIdentifier::builder().key(key).build())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|error| format!("invalid object identifier: {error}"))?;
                if objects.is_empty() {
                    continue;
                }

                let count = objects.len();
                let delete = Delete::builder()
                    .set_objects(Some(objects))
                    .build()
                    .map_err(|error| format!("invalid delete request: {error}"))?;
                self.client
                    .delete_objects()
                    .bucket(bucket_name)
                    .delete(delete)
                    .send()
                    .await
                    .map_err(|error| {
                        format!("failed to delete objects from {bucket_name}: {error}")
                    })?;
                deleted += count;
            }

            self.client
                .delete_bucket()
                .bucket(bucket_name)
                .send()
                .await
                .map_err(|error| format!("failed to delete bucket {bucket_name}: {error}"))?;
            Ok(deleted)
        })
    }
}

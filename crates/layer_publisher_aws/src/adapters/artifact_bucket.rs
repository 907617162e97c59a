#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCreation {
    Created,
    AlreadyExists,
}

/// Staging bucket for packaged templates.
pub trait ArtifactBucket {
    /// Idempotent: an existing bucket is reported, not treated as an error.
    fn create_bucket(&self, bucket_name: &str, region: &str) -> Result<BucketCreation, String>;

    /// Deletes every object and then the bucket itself. Returns the number of
    /// objects removed.
    fn delete_bucket(&self, bucket_name: &str) -> Result<usize, String>;
}

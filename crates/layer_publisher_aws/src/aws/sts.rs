use crate::adapters::account::AccountResolver;

use super::block_on;

pub struct StsAccountResolver {
    client: aws_sdk_sts::Client,
}

impl StsAccountResolver {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(config),
        }
    }
}

impl AccountResolver for StsAccountResolver {
    fn account_id(&self) -> Result<String, String> {
        let output = block_on(self.client.get_caller_identity().send())
            .map_err(|error| format!("failed to resolve caller identity: {error}"))?;
        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| "caller identity did not include an account id".to_string())
    }
}

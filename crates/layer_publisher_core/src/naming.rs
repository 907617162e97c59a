use crate::template::TemplateArchitecture;

pub const BUCKET_NAME_PREFIX: &str = "layer-publisher";

/// `aws-cloudwatch-logs-url` -> `AwsCloudwatchLogsUrl`.
pub fn pascalize(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut capitalize_next = true;
    for c in text.chars() {
        if c == '-' || c == '_' || c.is_whitespace() {
            capitalize_next = true;
            continue;
        }
        if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

pub fn logical_name_suffix(arch: TemplateArchitecture, runtime: &str) -> String {
    format!(
        "{}{}",
        pascalize(runtime).replace('.', ""),
        arch.name_suffix()
    )
}

pub fn logical_name_layer(arch: TemplateArchitecture, runtime: &str) -> String {
    format!("Layer{}", logical_name_suffix(arch, runtime))
}

pub fn logical_name_permission(arch: TemplateArchitecture, runtime: &str) -> String {
    format!("Permission{}", logical_name_suffix(arch, runtime))
}

pub fn stack_name(identifier: &str) -> String {
    format!("Layer{}", pascalize(identifier))
}

/// Deployment bucket, unique per account and region.
pub fn bucket_name(account_id: &str, region: &str) -> String {
    format!("{BUCKET_NAME_PREFIX}-{account_id}-{region}")
}

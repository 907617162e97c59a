//! SAM template and deploy script rendering for a single layer.

use crate::description::DescriptionData;
use crate::naming::{logical_name_layer, logical_name_permission, logical_name_suffix, pascalize, stack_name};
use crate::ordering::{ARCH_ARM64, ARCH_X86_64};

pub const DEFAULT_LAYER_NAME_PREFIX: &str = "LuciferousPublicLayer";
pub const TEMPLATE_FILE: &str = "sam.yml";
pub const PACKAGED_TEMPLATE_FILE: &str = "template.yml";
pub const DEPLOY_SCRIPT_FILE: &str = "deploy.sh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateArchitecture {
    Amd,
    Arm,
    /// One layer compatible with both architectures.
    Both,
}

impl TemplateArchitecture {
    pub fn name_suffix(self) -> &'static str {
        match self {
            Self::Amd => "Amd",
            Self::Arm => "Arm",
            Self::Both => "",
        }
    }

    pub fn module_dir(self) -> &'static str {
        match self {
            Self::Arm => "arm",
            Self::Amd | Self::Both => "amd",
        }
    }

    pub fn compatible_architectures(self) -> &'static [&'static str] {
        match self {
            Self::Amd => &[ARCH_X86_64],
            Self::Arm => &[ARCH_ARM64],
            Self::Both => &[ARCH_ARM64, ARCH_X86_64],
        }
    }
}

pub fn calc_architectures(is_architecture_split: bool) -> Vec<TemplateArchitecture> {
    if is_architecture_split {
        vec![TemplateArchitecture::Amd, TemplateArchitecture::Arm]
    } else {
        vec![TemplateArchitecture::Both]
    }
}

pub fn filter_runtimes(all_runtimes: &[String], ignore_versions: &[String]) -> Vec<String> {
    all_runtimes
        .iter()
        .filter(|runtime| !ignore_versions.contains(*runtime))
        .cloned()
        .collect()
}

pub fn render_layer(
    arch: TemplateArchitecture,
    runtime: &str,
    description: &DescriptionData,
    layer_name_prefix: &str,
) -> Vec<String> {
    // modules/<amd|arm>/<runtime> is where the build step leaves each package
    let mut lines = vec![
        format!("  {}:", logical_name_layer(arch, runtime)),
        "    Type: AWS::Serverless::LayerVersion".to_string(),
        "    Properties:".to_string(),
        "      RetentionPolicy: Retain".to_string(),
        format!("      ContentUri: modules/{}/{runtime}", arch.module_dir()),
        format!(
            "      LayerName: {layer_name_prefix}{}{}",
            pascalize(&description.identifier),
            logical_name_suffix(arch, runtime)
        ),
        "      CompatibleArchitectures:".to_string(),
    ];
    lines.extend(
        arch.compatible_architectures()
            .iter()
            .map(|value| format!("        - {value}")),
    );
    lines.push("      CompatibleRuntimes:".to_string());
    lines.push(format!("        - {runtime}"));
    lines.push("      Description: |".to_string());
    lines.extend(
        description
            .render_lines()
            .into_iter()
            .map(|line| format!("        {line}")),
    );
    lines.push(String::new());
    lines
}

pub fn render_permission(arch: TemplateArchitecture, runtime: &str) -> Vec<String> {
    vec![
        format!("  {}:", logical_name_permission(arch, runtime)),
        "    Type: AWS::Lambda::LayerVersionPermission".to_string(),
        "    DeletionPolicy: Retain".to_string(),
        "    UpdateReplacePolicy: Retain".to_string(),
        "    Properties:".to_string(),
        "      Action: lambda:GetLayerVersion".to_string(),
        "      Principal: '*'".to_string(),
        format!(
            "      LayerVersionArn: !Ref {}",
            logical_name_layer(arch, runtime)
        ),
        String::new(),
    ]
}

pub fn render_template(
    architectures: &[TemplateArchitecture],
    runtimes: &[String],
    description: &DescriptionData,
    layer_name_prefix: &str,
) -> String {
    let mut lines = vec![
        "Transform: AWS::Serverless-2016-10-31".to_string(),
        "Resources:".to_string(),
    ];

    for &arch in architectures {
        for runtime in runtimes {
            lines.extend(render_layer(arch, runtime, description, layer_name_prefix));
            lines.extend(render_permission(arch, runtime));
        }
    }

    lines.join("\n")
}

pub fn render_deploy_script(bucket_name: &str, identifier: &str) -> String {
    [
        format!(
            "aws cloudformation package --s3-bucket {bucket_name} --template-file {TEMPLATE_FILE} --output-template-file {PACKAGED_TEMPLATE_FILE}"
        ),
        format!(
            "sam deploy --stack-name {} --template-file {PACKAGED_TEMPLATE_FILE}",
            stack_name(identifier)
        ),
    ]
    .join("\n")
}

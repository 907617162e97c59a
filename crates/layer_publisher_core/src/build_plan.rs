use crate::contract::LayerDefinition;
use crate::error::ValidationError;

pub const BUILD_SCRIPT: &str = "./build.sh";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildLines {
    pub amd: Vec<String>,
    pub arm: Vec<String>,
}

/// Which slice of the build matrix a CI runner owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerShard {
    pub runner_name: String,
    pub max_concurrency: usize,
    pub concurrency_index: usize,
}

impl RunnerShard {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrency == 0 {
            return Err(ValidationError::new(
                "max_concurrency must be a positive integer",
            ));
        }
        if self.concurrency_index >= self.max_concurrency {
            return Err(ValidationError::new(format!(
                "concurrency_index {} must be less than max_concurrency={}",
                self.concurrency_index, self.max_concurrency
            )));
        }
        Ok(())
    }

    pub fn is_arm(&self) -> bool {
        self.runner_name.contains("arm")
    }
}

pub fn generate_lines(layer: &LayerDefinition, all_runtimes: &[String]) -> BuildLines {
    let packages = layer.packages.join(" ");
    let ignored = layer.ignore_versions();
    let lines_for = |arch: &str| -> Vec<String> {
        all_runtimes
            .iter()
            .filter(|runtime| !ignored.contains(*runtime))
            .map(|runtime| {
                format!("{BUILD_SCRIPT} --packages {packages} --arch {arch} --runtime {runtime}")
            })
            .collect()
    };

    BuildLines {
        amd: lines_for("amd"),
        arm: lines_for("arm"),
    }
}

/// Arm runners only build split layers; dual-architecture layers come from
/// the amd build. The selected lines are then dealt round-robin across the
/// runner's concurrency slots.
pub fn filter_lines(
    base_lines: &BuildLines,
    shard: &RunnerShard,
    is_architecture_split: bool,
) -> Result<Vec<String>, ValidationError> {
    shard.validate()?;

    let lines: &[String] = match (shard.is_arm(), is_architecture_split) {
        (true, true) => &base_lines.arm,
        (true, false) => &[],
        (false, _) => &base_lines.amd,
    };

    Ok(lines
        .iter()
        .enumerate()
        .filter(|(index, _)| index % shard.max_concurrency == shard.concurrency_index)
        .map(|(_, line)| line.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(ignore_versions: Option<Vec<&str>>, is_architecture_split: bool) -> LayerDefinition {
        LayerDefinition {
            identifier: "aws-cloudwatch-logs-url".to_string(),
            packages: vec!["aws-cloudwatch-logs-url==1.0.3".to_string()],
            ignore_versions: ignore_versions
                .map(|values| values.into_iter().map(str::to_string).collect()),
            is_architecture_split,
            note: None,
        }
    }

    fn runtimes() -> Vec<String> {
        ["python3.13", "python3.12", "python3.11"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn shard(runner_name: &str, max_concurrency: usize, concurrency_index: usize) -> RunnerShard {
        RunnerShard {
            runner_name: runner_name.to_string(),
            max_concurrency,
            concurrency_index,
        }
    }

    #[test]
    fn generates_lines_per_architecture_skipping_ignored_runtimes() {
        let lines = generate_lines(&layer(Some(vec!["python3.12"]), true), &runtimes());

        assert_eq!(
            lines.amd,
            vec![
                "./build.sh --packages aws-cloudwatch-logs-url==1.0.3 --arch amd --runtime python3.13",
                "./build.sh --packages aws-cloudwatch-logs-url==1.0.3 --arch amd --runtime python3.11",
            ]
        );
        assert_eq!(
            lines.arm[1],
            "./build.sh --packages aws-cloudwatch-logs-url==1.0.3 --arch arm --runtime python3.11"
        );
    }

    #[test]
    fn amd_runner_takes_round_robin_slice() {
        let lines = generate_lines(&layer(None, false), &runtimes());

        let first = filter_lines(&lines, &shard("ubuntu-24.04", 2, 0), false).expect("filter");
        let second = filter_lines(&lines, &shard("ubuntu-24.04", 2, 1), false).expect("filter");

        assert_eq!(first, vec![lines.amd[0].clone(), lines.amd[2].clone()]);
        assert_eq!(second, vec![lines.amd[1].clone()]);
    }

    #[test]
    fn arm_runner_skips_unsplit_layers() {
        let lines = generate_lines(&layer(None, false), &runtimes());
        let selected = filter_lines(&lines, &shard("ubuntu-24.04-arm", 2, 0), false).expect("filter");
        assert!(selected.is_empty());
    }

    #[test]
    fn arm_runner_builds_split_layers() {
        let lines = generate_lines(&layer(None, true), &runtimes());
        let selected = filter_lines(&lines, &shard("ubuntu-24.04-arm", 2, 1), true).expect("filter");
        assert_eq!(selected, vec![lines.arm[1].clone()]);
    }

    #[test]
    fn rejects_out_of_range_shard() {
        let lines = generate_lines(&layer(None, false), &runtimes());

        let error = filter_lines(&lines, &shard("ubuntu-24.04", 0, 0), false).expect_err("zero");
        assert_eq!(error.message(), "max_concurrency must be a positive integer");

        let error = filter_lines(&lines, &shard("ubuntu-24.04", 2, 2), false).expect_err("index");
        assert_eq!(
            error.message(),
            "concurrency_index 2 must be less than max_concurrency=2"
        );
    }
}

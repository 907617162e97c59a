use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const CORE_PACKAGE: &str = "layer_publisher_core";
const AWS_PACKAGE: &str = "layer_publisher_aws";
const BINARY: &str = "layer-publisher";
const DIST_DIR: &str = "dist/bin";

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the layer publisher workspace",
    long_about = "Runs CI checks and packages the layer-publisher binary that\n\
                  the publishing workflows download and invoke step by step."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the layer-publisher binary and zip it for workflow artifacts
    Package {
        /// Compilation target triple of the CI runners
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Tests for both crates
    Test,
    /// Lint then test
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
    ]);
}

fn ci_test() {
    for package in [CORE_PACKAGE, AWS_PACKAGE] {
        step(&format!("Test {package}"));
        run_cargo(&["test", "-p", package]);
    }
}

fn package_binary(target: &str, profile: BuildProfile) -> PathBuf {
    step(&format!("Build {BINARY} for {target}"));
    let mut cargo_args = vec!["build", "-p", AWS_PACKAGE, "--bin", BINARY, "--target", target];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    let binary_path = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(binary_name(target));
    if !binary_path.exists() {
        panic!("expected binary at '{}'", binary_path.display());
    }

    step("Zip workflow artifact");
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create dist directory");
    let zip_path = dist_dir.join(format!("{BINARY}-{target}.zip"));

    let binary = fs::read(&binary_path).expect("failed to read binary");
    let file = fs::File::create(&zip_path).expect("failed to create artifact zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(binary_name(target), options)
        .expect("failed to start binary entry");
    zip.write_all(&binary).expect("failed to write binary entry");
    zip.finish().expect("failed to finish artifact zip");

    zip_path
}

fn binary_name(target: &str) -> String {
    if target.contains("windows") {
        format!("{BINARY}.exe")
    } else {
        BINARY.to_string()
    }
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::Package { target, profile } => {
            let zip_path = package_binary(&target, profile);
            eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
        }
    }
}

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use stack_ttl_core::plan::{build_plan, select_stacks, StackCandidate, TtlProps};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "stack_ttl_lambda";
const LAMBDA_BINARY: &str = "ttl_lambda";
const DIST_DIR: &str = "dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the stack TTL workspace",
    long_about = "A unified CLI for packaging the stack termination lambda,\n\
                  rendering TTL deployment plans, and running CI checks."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and package the termination lambda as a `bootstrap` zip
    ServerlessPackage {
        /// Compilation target triple for the lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Print the TTL termination plan (environment, schedule, policy) as JSON
    TtlPlan {
        /// Prefix used for exported output names
        #[arg(long)]
        prefix: String,
        /// Stack to terminate when the TTL expires (repeatable)
        #[arg(long = "stack")]
        stacks: Vec<String>,
        /// Stack with termination protection; listed but never scheduled (repeatable)
        #[arg(long = "protected-stack")]
        protected_stacks: Vec<String>,
        /// Minutes before the stacks are deleted
        #[arg(long)]
        ttl_minutes: u32,
        /// Account owning the stacks
        #[arg(long, env = "CDK_DEFAULT_ACCOUNT")]
        account: Option<String>,
        /// Region of the stacks
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,
        /// Name of the stack hosting the termination lambda
        #[arg(long)]
        self_stack: String,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Check, then package the lambda
    All,
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

// ── helpers ────────────────────────────────────────────────────────

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

fn package_serverless_lambda(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);

    step("Build termination lambda binary");

    let mut cargo_args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--target",
        target,
        "--bin",
        LAMBDA_BINARY,
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package lambda zip artifact");
    let target_dir = Path::new("target").join(target).join(profile.dir_name());
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create lambda dist directory");

    let zip_path = dist_dir.join(format!("{LAMBDA_BINARY}.zip"));
    package_lambda_zip(
        &target_dir.join(binary_name(LAMBDA_BINARY, target)),
        &zip_path,
    );

    eprintln!("\nPackaged artifact:\n- {}", zip_path.display());
}

fn ensure_rust_target_installed(target: &str) {
    let output = Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output();

    let output = match output {
        Ok(value) => value,
        Err(error) => {
            eprintln!(
                "warning: failed to run `rustup target list --installed` ({error}); continuing without target preflight"
            );
            return;
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "failed to list installed rust targets; run `rustup target list --installed` manually. details: {}",
            stderr.trim()
        );
    }

    let installed = String::from_utf8_lossy(&output.stdout);
    if !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "required rust target `{target}` is not installed. install it with `rustup target add {target}` and re-run `cargo run -p xtask -- serverless-package`"
        );
    }
}

fn binary_name(bin_name: &str, target: &str) -> String {
    if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    }
}

fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    if !binary_path.exists() {
        panic!("expected lambda binary at '{}'", binary_path.display());
    }

    let binary = fs::read(binary_path).expect("failed to read lambda binary");
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

#[allow(clippy::too_many_arguments)]
fn print_ttl_plan(
    prefix: String,
    stacks: Vec<String>,
    protected_stacks: Vec<String>,
    ttl_minutes: u32,
    account: Option<String>,
    region: Option<String>,
    self_stack: &str,
) {
    let mut props = TtlProps {
        prefix_name: prefix,
        stack_names: Vec::new(),
        ttl_minutes,
        account,
        region,
    };

    let candidates: Vec<StackCandidate> = stacks
        .into_iter()
        .map(|stack_name| StackCandidate {
            stack_name,
            termination_protection: false,
        })
        .chain(protected_stacks.into_iter().map(|stack_name| StackCandidate {
            stack_name,
            termination_protection: true,
        }))
        .collect();

    for skipped in select_stacks(&mut props, &candidates) {
        eprintln!("skipping termination-protected stack '{skipped}'");
    }

    let plan = match build_plan(&props, self_stack) {
        Ok(value) => value,
        Err(error) => {
            eprintln!("error: {error}");
            exit(2);
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&plan).expect("plan should serialize")
    );
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test stack_ttl_core");
    run_cargo(&["test", "-p", "stack_ttl_core"]);

    step("Test stack_ttl_lambda");
    run_cargo(&["test", "-p", LAMBDA_PACKAGE]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::ServerlessPackage { target, profile } => {
            package_serverless_lambda(&target, profile);
        }
        Commands::TtlPlan {
            prefix,
            stacks,
            protected_stacks,
            ttl_minutes,
            account,
            region,
            self_stack,
        } => {
            print_ttl_plan(
                prefix,
                stacks,
                protected_stacks,
                ttl_minutes,
                account,
                region,
                &self_stack,
            );
        }
        Commands::Ci { job } => match job {
            CiJob::Check => ci_check(),
            CiJob::All => {
                ci_check();
                package_serverless_lambda("x86_64-unknown-linux-gnu", BuildProfile::Release);
            }
        },
    }
}

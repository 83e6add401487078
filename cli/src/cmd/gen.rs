use hwgrade_core::{action, Config};

use crate::util;

use super::{GlobalArgs, SubcmdResult};

/// Run the reference program and generate the expected outputs,
/// without grading anything.
#[derive(Debug, clap::Args)]
pub struct Args {
    /// The number of homework
    #[arg(value_name = "HW")]
    pub hw: String,

    /// The number of problem
    #[arg(value_name = "P")]
    pub problem: String,

    /// Show the progress verbosely
    #[arg(short, long)]
    pub verbose: bool,

    /// Build the reference program before generating
    #[arg(short, long)]
    pub build: bool,

    /// Specify the compiler (default: the configured one)
    #[arg(short, long, value_name = "C")]
    pub compiler: Option<String>,

    /// The timeout of subprocesses in seconds
    #[arg(short, long, value_name = "T", default_value_t = 1.0)]
    pub timeout: f64,
}

pub async fn exec(args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = Config::from_file_finding_in_ancestors(util::current_dir())?;

    let opts = action::GenerateOptions {
        hw: args.hw.clone(),
        problem: args.problem.clone(),
        verbose: args.verbose,
        build: args.build,
        compiler: args.compiler.clone(),
        timeout_secs: args.timeout,
    };

    let _ = action::do_generate(&cfg, &opts).await?;
    Ok(())
}

use hwgrade_core::{action, Config};

use crate::util;

use super::{GlobalArgs, SubcmdResult};

/// Grade a problem of a homework.
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

    /// Grade all the students listed in the roster file
    #[arg(short, long)]
    pub all: bool,

    /// Build the program before grading
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

    let opts = action::GradeOptions {
        hw: args.hw.clone(),
        problem: args.problem.clone(),
        verbose: args.verbose,
        all: args.all,
        build: args.build,
        compiler: args.compiler.clone(),
        timeout_secs: args.timeout,
    };

    let _ = action::do_grade(&cfg, &opts).await?;
    Ok(())
}

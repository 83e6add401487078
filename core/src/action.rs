pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use error::*;

use crate::builder::Builder;
use crate::config::{Config, ProblemSpec, ProgramPaths};
use crate::grading::{
    generate_expected, grade_subject, load_all, FsFixtureStore, ProgramRunner, SubjectRun,
};
use crate::print_success;
use crate::roster;

/// Display name of the subject in single-student mode.
pub const LOCAL_SUBJECT: &str = "your program";

#[derive(Debug, Clone)]
pub struct GradeOptions {
    pub hw: String,
    pub problem: String,
    pub verbose: bool,
    pub all: bool,
    pub build: bool,
    pub compiler: Option<String>,
    pub timeout_secs: f64,
}

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub hw: String,
    pub problem: String,
    pub verbose: bool,
    pub build: bool,
    pub compiler: Option<String>,
    pub timeout_secs: f64,
}

fn validate_time_limit(timeout_secs: f64) -> Result<Duration> {
    ensure!(
        timeout_secs.is_finite() && timeout_secs > 0.0,
        "timeout value must be positive"
    );
    Ok(Duration::from_secs_f64(timeout_secs))
}

fn resolve_problem_spec(cfg: &Config, hw: &str, problem: &str) -> Result<ProblemSpec> {
    cfg.problem_spec(hw, problem)
        .with_context(|| format!("Invalid homework or problem number: hw={} p={}", hw, problem))
}

fn make_builder(cfg: &Config, compiler_override: &Option<String>) -> Builder {
    let compiler = compiler_override
        .clone()
        .unwrap_or_else(|| cfg.build.compiler.clone());
    Builder::new(compiler, cfg.build.options.clone())
}

/// Grades one subject, or every subject in the roster with `--all`.
/// Build failures skip the affected subject; execution failures are
/// scored as zero inside the session. Neither aborts the batch.
pub async fn do_grade(cfg: &Config, opts: &GradeOptions) -> Result<Vec<SubjectRun>> {
    let spec = resolve_problem_spec(cfg, &opts.hw, &opts.problem)?;
    let time_limit = validate_time_limit(opts.timeout_secs)?;
    let base_dir = cfg.base_dir();

    let subjects: Vec<String> = if opts.all {
        roster::read_roster(base_dir.join(&cfg.paths.roster))?
    } else {
        vec![LOCAL_SUBJECT.to_owned()]
    };

    let builder = opts.build.then(|| make_builder(cfg, &opts.compiler));

    let mut runs = Vec::with_capacity(subjects.len());
    for subject in &subjects {
        let prog = if opts.all {
            cfg.paths.all_student_program(&opts.hw, &opts.problem, subject)?
        } else {
            cfg.paths.student_program(&opts.hw, &opts.problem)?
        };

        if let Some(builder) = &builder {
            if !build_subject(builder, base_dir, &prog, subject).await {
                continue;
            }
        }

        let store = FsFixtureStore::new(base_dir, &cfg.paths, opts.hw.as_str(), opts.problem.as_str());
        let testcases = load_all(&store, spec.num_cases)?;

        let runner = ProgramRunner::new(base_dir.join(&prog.exec)).time_limit(time_limit);
        let run = grade_subject(subject, &runner, &testcases, spec.comparator, opts.verbose).await?;
        runs.push(run);
    }

    Ok(runs)
}

async fn build_subject(
    builder: &Builder,
    base_dir: &Path,
    prog: &ProgramPaths,
    subject: &str,
) -> bool {
    println!("Building {}...", subject);
    match builder
        .build(&base_dir.join(&prog.source), &base_dir.join(&prog.exec))
        .await
    {
        Ok(()) => {
            print_success!("Successfully built {}.", subject);
            println!();
            true
        }
        Err(e) => {
            println!("{}", format!("Failed to build {}: {:#}", subject, e).red());
            println!();
            false
        }
    }
}

/// Runs the reference program over every testcase input and writes its
/// stdout back as the expected-output fixtures.
pub async fn do_generate(cfg: &Config, opts: &GenerateOptions) -> Result<usize> {
    let spec = resolve_problem_spec(cfg, &opts.hw, &opts.problem)?;
    let time_limit = validate_time_limit(opts.timeout_secs)?;
    let base_dir = cfg.base_dir();

    let prog = cfg.paths.ref_program(&opts.hw, &opts.problem)?;

    if opts.build {
        let builder = make_builder(cfg, &opts.compiler);
        println!("Building the reference program...");
        builder
            .build(&base_dir.join(&prog.source), &base_dir.join(&prog.exec))
            .await
            .context("Failed to build the reference program")?;
        print_success!("Successfully built the reference program.");
        println!();
    }

    let store = FsFixtureStore::new(base_dir, &cfg.paths, opts.hw.as_str(), opts.problem.as_str());
    let runner = ProgramRunner::new(base_dir.join(&prog.exec)).time_limit(time_limit);
    generate_expected(&runner, &store, spec.num_cases, opts.verbose).await
}

/// Writes the example config into `dir`. Refuses to overwrite.
pub fn init_config_file(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let path = dir.as_ref().join(Config::FILENAME);
    ensure!(!path.exists(), "Config file already exists: {:?}", path);
    fsutil::write_with_mkdir(&path, Config::example_toml())?;
    Ok(path)
}

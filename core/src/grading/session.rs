use std::{sync::Arc, time::Duration};

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::Mutex;

use super::compare::{Comparator, Verdict};
use super::exec::{ExecStatus, Execution, ProgramRunner};
use super::testcase::{FixtureStore, TestCase};
use crate::style;

#[derive(Debug, Clone, PartialEq)]
pub enum CaseVerdict {
    Graded(Verdict),
    TimedOut,
    NonZeroExit(Option<i32>),
    SpawnError,
}

impl CaseVerdict {
    pub fn score(&self) -> f64 {
        match self {
            Self::Graded(v) => v.score,
            _ => 0.0,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Graded(v) if v.is_full())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseResult {
    pub index: usize,
    pub verdict: CaseVerdict,
    pub execution_time: Duration,
    pub stderr: String,
}

impl CaseResult {
    fn new(testcase: &TestCase, comparator: Comparator, exec: Execution) -> Self {
        let verdict = match exec.status {
            ExecStatus::Ok => {
                let actual = String::from_utf8_lossy(&exec.stdout);
                CaseVerdict::Graded(comparator.compare(&testcase.expected, &actual))
            }
            ExecStatus::TimedOut => CaseVerdict::TimedOut,
            ExecStatus::NonZeroExit => CaseVerdict::NonZeroExit(exec.exit_code),
            ExecStatus::SpawnError => CaseVerdict::SpawnError,
        };
        Self {
            index: testcase.index,
            verdict,
            execution_time: exec.execution_time,
            stderr: String::from_utf8_lossy(&exec.stderr).into_owned(),
        }
    }
}

/// Result of grading one subject over all testcases of a problem.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRun {
    pub subject: String,
    pub num_cases: usize,
    pub cases: Vec<CaseResult>,
}

impl SubjectRun {
    pub fn total_score(&self) -> f64 {
        self.cases.iter().map(|c| c.verdict.score()).sum()
    }
}

/// Grades one subject: every testcase in index order, each under the
/// runner's time limit. A failing case scores 0 and never aborts the
/// rest of the run.
pub async fn grade_subject(
    subject: &str,
    runner: &ProgramRunner,
    testcases: &[TestCase],
    comparator: Comparator,
    verbose: bool,
) -> anyhow::Result<SubjectRun> {
    println!("Grading {}...", subject);

    log::info!(
        "Running {:?} on {} testcases (time limit {}ms)",
        runner.get_program(),
        testcases.len(),
        runner.get_time_limit().as_millis(),
    );

    let spinner_style = ProgressStyle::default_bar()
        .template("{spinner} {msg}")
        .unwrap();

    let mut cases = Vec::with_capacity(testcases.len());
    let mut bars = Vec::with_capacity(testcases.len());
    let progress_bar_container = MultiProgress::new();

    // Prepare progress bar
    for t in testcases {
        let bar = progress_bar_container
            .add(ProgressBar::new(100))
            .with_style(spinner_style.clone())
            .with_message(format!("Test {} ...", t.index));
        let bar = Arc::new(Mutex::new(bar));
        bars.push(bar.clone());

        // Tick spinner
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(50)).await;
                let bar = bar.lock().await;
                if bar.is_finished() {
                    break;
                }
                bar.tick();
            }
        });
    }

    for (t, bar) in testcases.iter().zip(&bars) {
        let exec = runner.run(t.input.as_bytes()).await?;
        let res = CaseResult::new(t, comparator, exec);

        match &res.verdict {
            CaseVerdict::TimedOut => log::info!("Test {} failed: time out.", t.index),
            CaseVerdict::NonZeroExit(Some(code)) => {
                log::info!("Test {} failed: exit code {}.", t.index, code)
            }
            CaseVerdict::NonZeroExit(None) => {
                log::info!("Test {} failed: terminated by signal.", t.index)
            }
            CaseVerdict::SpawnError => {
                log::info!("Test {} failed: could not launch the program.", t.index)
            }
            CaseVerdict::Graded(_) => (),
        }

        let status = style::CaseStatus::of(&res.verdict);
        bar.lock().await.finish_with_message({
            format!(
                "Test {} ... {}{} [{}ms]",
                t.index,
                style::case_badge(status),
                " ".repeat(4 - status.to_string().len()),
                res.execution_time.as_millis(),
            )
            .cyan()
            .to_string()
        });
        cases.push(res);
    }
    print!("\n");

    let run = SubjectRun {
        subject: subject.to_owned(),
        num_cases: testcases.len(),
        cases,
    };

    if verbose {
        run.cases
            .iter()
            .filter(|c| !c.verdict.is_full())
            .for_each(style::print_case_detail);
    }
    style::print_run_summary(&run);

    Ok(run)
}

/// Runs the reference program on every input and persists its stdout as
/// the expected-output fixture. A case that times out or fails leaves
/// its fixture unwritten and does not stop the remaining indices.
pub async fn generate_expected(
    runner: &ProgramRunner,
    store: &dyn FixtureStore,
    num_cases: usize,
    verbose: bool,
) -> anyhow::Result<usize> {
    use anyhow::Context as _;

    println!("Generating output files...");
    if verbose {
        println!();
    }

    let mut num_generated = 0;
    for index in 0..num_cases {
        let input = store
            .load_input(index)
            .with_context(|| format!("Failed to fetch input of testcase {}", index))?;
        let exec = runner.run(input.as_bytes()).await?;
        match exec.status {
            ExecStatus::Ok => {
                store.save_expected(index, &String::from_utf8_lossy(&exec.stdout))?;
                num_generated += 1;
                if verbose {
                    println!("Test {} output generated.", index);
                }
            }
            ExecStatus::TimedOut => {
                if verbose {
                    println!("Test {} output not generated: time out.", index);
                }
            }
            ExecStatus::NonZeroExit => {
                if verbose {
                    match exec.exit_code {
                        Some(code) => {
                            println!("Test {} output not generated: exit code {}.", index, code)
                        }
                        None => println!(
                            "Test {} output not generated: terminated by signal.",
                            index
                        ),
                    }
                }
            }
            ExecStatus::SpawnError => {
                if verbose {
                    println!(
                        "Test {} output not generated: could not launch the program.",
                        index
                    );
                }
            }
        }
    }

    if verbose {
        println!();
    }
    if num_generated == num_cases {
        println!("All outputs generated.");
    } else {
        println!("{} of {} outputs generated.", num_generated, num_cases);
    }
    println!();

    Ok(num_generated)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grading::MemFixtureStore;

    const ECHO: &str = "import sys; sys.stdout.write(sys.stdin.read())";

    fn python_runner(script: &str) -> ProgramRunner {
        ProgramRunner::new("python3")
            .args(["-c", script])
            .time_limit(Duration::from_millis(1500))
    }

    fn testcases(pairs: &[(&str, &str)]) -> Vec<TestCase> {
        pairs
            .iter()
            .enumerate()
            .map(|(index, (input, expected))| TestCase {
                index,
                input: (*input).to_owned(),
                expected: (*expected).to_owned(),
            })
            .collect()
    }

    fn assert_total(run: &SubjectRun, want: f64) {
        let total = run.total_score();
        assert!((total - want).abs() < 1e-9, "total {} != {}", total, want);
        assert!(total >= 0.0 && total <= run.num_cases as f64);
    }

    #[tokio::test]
    async fn totals_follow_the_comparison_tiers() {
        let runner = python_runner(ECHO);
        // The subject echoes its input, so the tier of each case is
        // controlled by how the expected text deviates from the input.
        let testcases = testcases(&[
            ("ok\n", "ok\n"),                       // STRONG
            ("5", "5\n"),                           // NORMAL
            ("hello   world\n", "hello world\n"),   // WEAK
            ("3 2 1\n", "1 2 3\n"),                 // fail
        ]);

        let run = grade_subject("echo", &runner, &testcases, Comparator::Tiered, true)
            .await
            .unwrap();

        assert_eq!(run.num_cases, 4);
        assert!(run.cases[0].verdict.is_full());
        assert!(matches!(
            &run.cases[1].verdict,
            CaseVerdict::Graded(v) if v.passed && !v.is_full()
        ));
        assert!(matches!(
            &run.cases[3].verdict,
            CaseVerdict::Graded(v) if !v.passed
        ));
        assert_total(&run, 1.0 + 0.8 + 0.6 + 0.0);
    }

    #[tokio::test]
    async fn nonzero_exit_scores_zero_even_with_matching_output() {
        let runner = python_runner(r#"print("x"); exit(3)"#);
        let testcases = testcases(&[("", "x\n")]);

        let run = grade_subject("bad exit", &runner, &testcases, Comparator::Exact, false)
            .await
            .unwrap();

        assert_eq!(run.cases[0].verdict, CaseVerdict::NonZeroExit(Some(3)));
        assert_total(&run, 0.0);
    }

    #[tokio::test]
    async fn timeout_scores_zero_and_the_run_continues() {
        let runner = python_runner("import time; time.sleep(2)");
        let testcases = testcases(&[("", "a\n"), ("", "b\n")]);

        let run = grade_subject("sleeper", &runner, &testcases, Comparator::Tiered, false)
            .await
            .unwrap();

        assert_eq!(run.cases.len(), 2);
        assert!(run
            .cases
            .iter()
            .all(|c| c.verdict == CaseVerdict::TimedOut));
        assert_total(&run, 0.0);
    }

    #[tokio::test]
    async fn missing_program_scores_zero_not_error() {
        let runner = ProgramRunner::new("./no-such-program-here");
        let testcases = testcases(&[("", "a\n")]);

        let run = grade_subject("ghost", &runner, &testcases, Comparator::Tiered, false)
            .await
            .unwrap();

        assert_eq!(run.cases[0].verdict, CaseVerdict::SpawnError);
        assert_total(&run, 0.0);
    }

    #[tokio::test]
    async fn generate_writes_fixtures_through_the_store() {
        let runner = python_runner(ECHO);
        let store = MemFixtureStore::with_inputs(["1\n", "2 3\n"]);

        let n = generate_expected(&runner, &store, store.num_cases(), false)
            .await
            .unwrap();

        assert_eq!(n, 2);
        assert_eq!(store.expected(0).as_deref(), Some("1\n"));
        assert_eq!(store.expected(1).as_deref(), Some("2 3\n"));
    }

    #[tokio::test]
    async fn generate_leaves_failed_fixtures_unwritten() {
        // Echoes, but refuses the input starting with "boom".
        let script = r#"
import sys
s = sys.stdin.read()
sys.stdout.write(s)
sys.exit(1 if s.startswith("boom") else 0)
"#;
        let runner = python_runner(script);
        let store = MemFixtureStore::with_inputs(["fine\n", "boom\n"]);

        let n = generate_expected(&runner, &store, store.num_cases(), true)
            .await
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(store.expected(0).as_deref(), Some("fine\n"));
        assert_eq!(store.expected(1), None);
    }

    #[tokio::test]
    async fn generate_twice_is_idempotent() {
        let runner = python_runner(ECHO);
        let store = MemFixtureStore::with_inputs(["idem\n"]);

        generate_expected(&runner, &store, 1, false).await.unwrap();
        let first = store.expected(0);
        generate_expected(&runner, &store, 1, false).await.unwrap();

        assert_eq!(store.expected(0), first);
        assert_eq!(first.as_deref(), Some("idem\n"));
    }
}

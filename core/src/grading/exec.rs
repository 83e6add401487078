use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use anyhow::{bail, Context};
use tokio::{io::AsyncWriteExt, process::Command};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ExecStatus {
    Ok,
    TimedOut,
    NonZeroExit,
    SpawnError,
}

/// Outcome of one program invocation against one input. `stdout` is only
/// meaningful when `status` is `Ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub status: ExecStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
    pub execution_time: Duration,
}

impl Execution {
    pub fn is_ok(&self) -> bool {
        self.status == ExecStatus::Ok
    }

    fn aborted(status: ExecStatus, execution_time: Duration) -> Self {
        Self {
            status,
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
            execution_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgramRunner {
    program: PathBuf,
    args: Vec<String>,
    time_limit: Duration,
}

impl ProgramRunner {
    const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(1);

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            time_limit: Self::DEFAULT_TIME_LIMIT,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn get_program(&self) -> &Path {
        &self.program
    }

    pub fn get_time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Runs the program once, feeding `input` on stdin and capturing
    /// stdout/stderr until it exits or the time limit elapses. A child
    /// that outlives the time limit is killed before this returns.
    ///
    /// Spawn failures, timeouts and nonzero exits are classified in the
    /// returned `Execution`; only I/O failures while communicating with
    /// a live child surface as `Err`.
    pub async fn run(&self, input: &[u8]) -> anyhow::Result<Execution> {
        let start_at = tokio::time::Instant::now();

        let mut proc = match Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(proc) => proc,
            Err(e) => {
                log::info!("Failed to spawn {:?}: {}", self.program, e);
                return Ok(Execution::aborted(
                    ExecStatus::SpawnError,
                    start_at.elapsed(),
                ));
            }
        };

        let mut stdin = proc.stdin.take().context("Failed to open stdin")?;
        let mut stdout = proc.stdout.take().context("Failed to open stdout")?;
        let mut stderr = proc.stderr.take().context("Failed to open stderr")?;

        // A child that exits without reading stdin breaks the pipe;
        // treat that the same as input delivered.
        let _ = stdin.write_all(input).await;
        drop(stdin); // NOTE: this line is essential

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let res = tokio::time::timeout(self.time_limit, async {
            tokio::try_join!(
                tokio::io::copy(&mut stdout, &mut stdout_buf),
                tokio::io::copy(&mut stderr, &mut stderr_buf),
                proc.wait(),
            )
            .context("Failed to communicate with subprocess")
        })
        .await;

        let execution_time = start_at.elapsed();

        match res {
            Err(_) => {
                proc.kill()
                    .await
                    .unwrap_or_else(|e| log::warn!("Failed to kill timed-out process: {:#}", e));
                Ok(Execution::aborted(ExecStatus::TimedOut, execution_time))
            }

            Ok(Err(e)) => bail!(e),

            Ok(Ok((_, _, exit_status))) => {
                let status = if exit_status.success() {
                    ExecStatus::Ok
                } else {
                    ExecStatus::NonZeroExit
                };
                Ok(Execution {
                    status,
                    stdout: stdout_buf,
                    stderr: stderr_buf,
                    exit_code: exit_status.code(),
                    execution_time,
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct X {
        input: &'static str,
        pyscript: &'static str,
        want_status: ExecStatus,
        want_exit_code: Option<i32>,
        want_stdout: &'static str,
    }

    async fn run_test(x: X) {
        let r = ProgramRunner::new("python3")
            .args(["-c", x.pyscript])
            .time_limit(Duration::from_millis(1500));

        let res = dbg!(r.run(x.input.as_bytes()).await).unwrap();
        assert_eq!(res.status, x.want_status);
        assert_eq!(res.exit_code, x.want_exit_code);
        assert_eq!(res.stdout, x.want_stdout.as_bytes());
    }

    #[tokio::test]
    async fn should_be_ok() {
        run_test(X {
            input: "123\n",
            pyscript: r#"print("hello_" + input())"#,
            want_status: ExecStatus::Ok,
            want_exit_code: Some(0),
            want_stdout: "hello_123\n",
        })
        .await;
    }

    #[tokio::test]
    async fn should_be_ok_even_if_stdin_is_not_read() {
        run_test(X {
            input: "123\n",
            pyscript: r#"print("hello_123")"#,
            want_status: ExecStatus::Ok,
            want_exit_code: Some(0),
            want_stdout: "hello_123\n",
        })
        .await;
    }

    #[tokio::test]
    async fn should_be_nonzero_exit_even_if_stdout_is_correct() {
        run_test(X {
            input: "123\n",
            pyscript: r#"print("hello_123"); exit(42)"#,
            want_status: ExecStatus::NonZeroExit,
            want_exit_code: Some(42),
            want_stdout: "hello_123\n",
        })
        .await;
    }

    #[tokio::test]
    async fn should_be_timed_out_without_partial_output() {
        run_test(X {
            input: "123\n",
            pyscript: "import time; print(5); time.sleep(2)",
            want_status: ExecStatus::TimedOut,
            want_exit_code: None,
            want_stdout: "",
        })
        .await;
    }

    #[tokio::test]
    async fn should_be_spawn_error_for_missing_program() {
        let r = ProgramRunner::new("./no-such-program-here");
        let res = r.run(b"").await.unwrap();
        assert_eq!(res.status, ExecStatus::SpawnError);
        assert_eq!(res.exit_code, None);
    }

    #[tokio::test]
    async fn stderr_is_captured_but_separate() {
        let r = ProgramRunner::new("python3").args([
            "-c",
            r#"import sys; print("out"); print("oops", file=sys.stderr)"#,
        ]);
        let res = r.run(b"").await.unwrap();
        assert_eq!(res.status, ExecStatus::Ok);
        assert_eq!(res.stdout, b"out\n");
        assert_eq!(res.stderr, b"oops\n");
    }
}

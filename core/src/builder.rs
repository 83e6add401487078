use std::path::Path;

use anyhow::{bail, Context};
use tokio::process::Command;

/// External build collaborator: compiles one subject's source into an
/// executable. Any failure here means "skip this subject", decided by
/// the caller.
#[derive(Debug, Clone)]
pub struct Builder {
    compiler: String,
    options: Vec<String>,
}

impl Builder {
    pub fn new(compiler: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            compiler: compiler.into(),
            options,
        }
    }

    pub fn get_compiler(&self) -> &str {
        &self.compiler
    }

    pub async fn build(&self, source: &Path, output: &Path) -> anyhow::Result<()> {
        let status = Command::new(&self.compiler)
            .arg(source)
            .arg("-o")
            .arg(output)
            .args(&self.options)
            .status()
            .await
            .with_context(|| format!("Failed to spawn compiler '{}'", self.compiler))?;

        match status.code() {
            Some(0) => Ok(()),
            Some(code) => bail!("Compile error: exitcode={}", code),
            None => bail!("Failed to compile: process terminated by signal"),
        }
    }
}

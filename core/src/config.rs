use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::result::Result as StdResult;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::grading::Comparator;
use crate::interp::{self, InterpError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub paths: PathConfig,
    pub build: BuildConfig,
    pub homework: BTreeMap<String, HomeworkConfig>,
}

/// Path templates. `{hw}`, `{p}` and `{case}` (and `{student}` for the
/// per-student paths) are interpolated; relative paths are resolved
/// against the config file's directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathConfig {
    pub testcase_input: String,
    pub testcase_output: String,
    pub ref_source: String,
    pub ref_exec: String,
    pub student_source: String,
    pub student_exec: String,
    pub all_student_source: String,
    pub all_student_exec: String,
    pub roster: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildConfig {
    pub compiler: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HomeworkConfig {
    pub problem: BTreeMap<String, ProblemConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProblemConfig {
    pub num_cases: usize,
    pub comparator: Comparator,
}

/// Resolved configuration of one problem. Every (homework, problem) pair
/// the CLI accepts resolves to exactly one of these, or grading refuses
/// to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemSpec {
    pub hw: String,
    pub problem: String,
    pub num_cases: usize,
    pub comparator: Comparator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramPaths {
    pub source: PathBuf,
    pub exec: PathBuf,
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "hwgrade.toml";

    pub fn example_toml() -> String {
        let file = Asset::get(Self::FILENAME).unwrap();
        std::str::from_utf8(file.data.as_ref()).unwrap().to_owned()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file in ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
            .with_context(|| {
                format!(
                    "Not in a hwgrade dir: Cannot find '{}'",
                    Self::FILENAME
                )
            })
    }

    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_filepath = Config::find_file_in_ancestors(cur_dir)?;
        Self::from_toml_file(config_filepath)
    }

    /// Directory that relative paths in the config resolve against.
    pub fn base_dir(&self) -> &Path {
        self.source_config_file
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."))
    }

    pub fn problem_spec(&self, hw: &str, problem: &str) -> Option<ProblemSpec> {
        let p = self.homework.get(hw)?.problem.get(problem)?;
        Some(ProblemSpec {
            hw: hw.to_owned(),
            problem: problem.to_owned(),
            num_cases: p.num_cases,
            comparator: p.comparator,
        })
    }
}

impl PathConfig {
    fn vars(hw: &str, problem: &str) -> HashMap<&'static str, String> {
        let mut m = HashMap::new();
        m.insert("hw", hw.to_owned());
        m.insert("p", problem.to_owned());
        m
    }

    pub fn testcase_input(
        &self,
        hw: &str,
        problem: &str,
        case: usize,
    ) -> StdResult<PathBuf, InterpError> {
        let mut vars = Self::vars(hw, problem);
        vars.insert("case", case.to_string());
        interp::interp(&self.testcase_input, &vars).map(PathBuf::from)
    }

    pub fn testcase_output(
        &self,
        hw: &str,
        problem: &str,
        case: usize,
    ) -> StdResult<PathBuf, InterpError> {
        let mut vars = Self::vars(hw, problem);
        vars.insert("case", case.to_string());
        interp::interp(&self.testcase_output, &vars).map(PathBuf::from)
    }

    pub fn ref_program(&self, hw: &str, problem: &str) -> StdResult<ProgramPaths, InterpError> {
        let vars = Self::vars(hw, problem);
        Ok(ProgramPaths {
            source: interp::interp(&self.ref_source, &vars)?.into(),
            exec: interp::interp(&self.ref_exec, &vars)?.into(),
        })
    }

    pub fn student_program(&self, hw: &str, problem: &str) -> StdResult<ProgramPaths, InterpError> {
        let vars = Self::vars(hw, problem);
        Ok(ProgramPaths {
            source: interp::interp(&self.student_source, &vars)?.into(),
            exec: interp::interp(&self.student_exec, &vars)?.into(),
        })
    }

    pub fn all_student_program(
        &self,
        hw: &str,
        problem: &str,
        student: &str,
    ) -> StdResult<ProgramPaths, InterpError> {
        let mut vars = Self::vars(hw, problem);
        vars.insert("student", student.to_owned());
        Ok(ProgramPaths {
            source: interp::interp(&self.all_student_source, &vars)?.into(),
            exec: interp::interp(&self.all_student_exec, &vars)?.into(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn example_toml_should_be_parsable() {
        let toml = Config::example_toml();
        let cfg = dbg!(Config::from_toml(&toml)).unwrap();

        let Config {
            source_config_file,
            paths,
            build,
            homework,
        } = &cfg;

        assert_eq!(*source_config_file, None);
        assert_eq!(paths.testcase_input, "test_hw{hw}/p{p}/{case}.in");
        assert_eq!(paths.roster, Path::new("list.txt"));
        assert_eq!(build.compiler, "gcc");
        assert!(build.options.is_empty());
        assert_eq!(homework.len(), 1);

        let spec = cfg.problem_spec("2", "3").unwrap();
        assert_eq!(spec.num_cases, 10);
        assert_eq!(spec.comparator, Comparator::TieredIgnoreBlank);

        assert_eq!(cfg.problem_spec("2", "9"), None);
        assert_eq!(cfg.problem_spec("1", "1"), None);
    }

    #[test]
    fn path_templates_interpolate() {
        let cfg = Config::from_toml(&Config::example_toml()).unwrap();

        assert_eq!(
            cfg.paths.testcase_input("2", "1", 7).unwrap(),
            Path::new("test_hw2/p1/7.in")
        );
        assert_eq!(
            cfg.paths.testcase_output("2", "1", 7).unwrap(),
            Path::new("test_hw2/p1/7.out")
        );

        let prog = cfg.paths.all_student_program("2", "1", "20180001").unwrap();
        assert_eq!(prog.source, Path::new("gitlab/20180001/hw2/hw2_1.c"));
        assert_eq!(prog.exec, Path::new("gitlab/20180001/hw2/hw2_1"));
    }
}

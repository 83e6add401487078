use std::{
    path::PathBuf,
    sync::Mutex,
};

use anyhow::Context as _;

use crate::config::PathConfig;

/// One (input, expected-output) pair of a problem, identified by its
/// 0-based ordinal index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub index: usize,
    pub input: String,
    pub expected: String,
}

/// Store of testcase fixtures for one (homework, problem) pair. Grading
/// reads through it; `gen` mode writes expected outputs back through it.
pub trait FixtureStore {
    fn load_input(&self, index: usize) -> anyhow::Result<String>;
    fn load_expected(&self, index: usize) -> anyhow::Result<String>;
    fn save_expected(&self, index: usize, data: &str) -> anyhow::Result<()>;
}

/// Fetches testcases `0..num_cases` in index order. Problems declare a
/// fixed case count, so a missing fixture aborts before any grading.
pub fn load_all(store: &dyn FixtureStore, num_cases: usize) -> anyhow::Result<Vec<TestCase>> {
    let mut testcases = Vec::with_capacity(num_cases);
    for index in 0..num_cases {
        let input = store
            .load_input(index)
            .with_context(|| format!("Failed to fetch input of testcase {}", index))?;
        let expected = store
            .load_expected(index)
            .with_context(|| format!("Failed to fetch expected output of testcase {}", index))?;
        testcases.push(TestCase {
            index,
            input,
            expected,
        });
    }
    Ok(testcases)
}

/// Fixtures on disk, addressed by the configured path templates.
#[derive(Debug, Clone)]
pub struct FsFixtureStore {
    base_dir: PathBuf,
    paths: PathConfig,
    hw: String,
    problem: String,
}

impl FsFixtureStore {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        paths: &PathConfig,
        hw: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            paths: paths.clone(),
            hw: hw.into(),
            problem: problem.into(),
        }
    }

    fn input_path(&self, index: usize) -> anyhow::Result<PathBuf> {
        let path = self.paths.testcase_input(&self.hw, &self.problem, index)?;
        Ok(self.base_dir.join(path))
    }

    fn expected_path(&self, index: usize) -> anyhow::Result<PathBuf> {
        let path = self.paths.testcase_output(&self.hw, &self.problem, index)?;
        Ok(self.base_dir.join(path))
    }
}

impl FixtureStore for FsFixtureStore {
    fn load_input(&self, index: usize) -> anyhow::Result<String> {
        Ok(fsutil::read_to_string(self.input_path(index)?)?)
    }

    fn load_expected(&self, index: usize) -> anyhow::Result<String> {
        Ok(fsutil::read_to_string(self.expected_path(index)?)?)
    }

    fn save_expected(&self, index: usize, data: &str) -> anyhow::Result<()> {
        Ok(fsutil::write_with_mkdir(self.expected_path(index)?, data)?)
    }
}

/// In-memory fixtures, for exercising the engine without touching disk.
#[derive(Debug, Default)]
pub struct MemFixtureStore {
    inputs: Vec<String>,
    expected: Mutex<Vec<Option<String>>>,
}

impl MemFixtureStore {
    pub fn new<I, S>(cases: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let (inputs, expected) = cases
            .into_iter()
            .map(|(input, expected)| (input.into(), Some(expected.into())))
            .unzip();
        Self {
            inputs,
            expected: Mutex::new(expected),
        }
    }

    /// A store with inputs only, as `gen` mode sees the world.
    pub fn with_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let inputs: Vec<String> = inputs.into_iter().map(Into::into).collect();
        let expected = vec![None; inputs.len()];
        Self {
            inputs,
            expected: Mutex::new(expected),
        }
    }

    pub fn num_cases(&self) -> usize {
        self.inputs.len()
    }

    pub fn expected(&self, index: usize) -> Option<String> {
        self.expected.lock().unwrap().get(index).cloned().flatten()
    }
}

impl FixtureStore for MemFixtureStore {
    fn load_input(&self, index: usize) -> anyhow::Result<String> {
        self.inputs
            .get(index)
            .cloned()
            .with_context(|| format!("No input recorded for testcase {}", index))
    }

    fn load_expected(&self, index: usize) -> anyhow::Result<String> {
        self.expected(index)
            .with_context(|| format!("No expected output recorded for testcase {}", index))
    }

    fn save_expected(&self, index: usize, data: &str) -> anyhow::Result<()> {
        let mut expected = self.expected.lock().unwrap();
        let slot = expected
            .get_mut(index)
            .with_context(|| format!("No such testcase: {}", index))?;
        *slot = Some(data.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn load_all_fetches_cases_in_index_order() {
        let store = MemFixtureStore::new([("1\n", "one\n"), ("2\n", "two\n")]);
        let testcases = load_all(&store, 2).unwrap();
        assert_eq!(
            testcases,
            vec![
                TestCase {
                    index: 0,
                    input: "1\n".into(),
                    expected: "one\n".into(),
                },
                TestCase {
                    index: 1,
                    input: "2\n".into(),
                    expected: "two\n".into(),
                },
            ]
        );
    }

    #[test]
    fn load_all_fails_on_missing_fixture() {
        let store = MemFixtureStore::new([("1\n", "one\n")]);
        assert!(load_all(&store, 2).is_err());
    }

    #[test]
    fn save_expected_is_visible_to_load_expected() {
        let store = MemFixtureStore::with_inputs(["1\n"]);
        assert!(store.load_expected(0).is_err());

        store.save_expected(0, "one\n").unwrap();
        assert_eq!(store.load_expected(0).unwrap(), "one\n");
        assert_eq!(store.expected(0).as_deref(), Some("one\n"));
    }
}

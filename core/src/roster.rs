use std::path::Path;

use anyhow::Context as _;

/// Reads the roster file and returns the student ids in file order.
/// Ids are 8 to 10 digit numbers; everything else in the file (names,
/// separators, comments) is ignored.
pub fn read_roster(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
    let text = fsutil::read_to_string(&path).context("Failed to read the student list")?;
    Ok(parse_roster(&text))
}

pub fn parse_roster(text: &str) -> Vec<String> {
    let ids: Vec<String> = lazy_regex::regex!(r"\d{8,10}")
        .find_iter(text)
        .map(|m| m.as_str().to_owned())
        .collect();
    if ids.is_empty() {
        log::warn!("No student ids found in the roster");
    }
    ids
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ids_are_extracted_in_file_order() {
        let text = "20180001 Alice\n20180002\tBob\n# comment\n20199999,Carol\n";
        assert_eq!(
            parse_roster(text),
            vec!["20180001", "20180002", "20199999"]
        );
    }

    #[test]
    fn short_numbers_are_not_ids() {
        assert_eq!(parse_roster("hw2 p1 42 1234567\n"), Vec::<String>::new());
    }

    #[test]
    fn empty_roster_yields_no_ids() {
        assert!(parse_roster("").is_empty());
    }
}

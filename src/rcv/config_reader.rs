use crate::rcv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub threshold: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
}

impl FileSource {
    pub fn csv(file_path: &str, first_vote_row: Option<usize>) -> FileSource {
        FileSource {
            provider: "csv".to_string(),
            file_path: file_path.to_string(),
            _first_vote_row_index: first_vote_row.map(|x| JSValue::from(x as u64)),
        }
    }

    /// The row of the candidate list, 1-based. Defaults to the first row.
    pub fn first_vote_row_index(&self) -> RcvResult<usize> {
        match self._first_vote_row_index {
            None => Ok(1),
            Some(_) => {
                let x = read_js_int(&self._first_vote_row_index)?;
                if x == 0 {
                    whatever!("firstVoteRowIndex is 1-based, 0 is not a valid row");
                }
                Ok(x)
            }
        }
    }

    pub fn set_first_vote_row_index(&mut self, row: usize) {
        self._first_vote_row_index = Some(JSValue::from(row as u64));
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RcvRules {
    #[serde(rename = "tiebreakMode")]
    pub tiebreak_mode: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<String>,
    #[serde(rename = "rulesDescription")]
    pub rules_description: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources", default)]
    pub cvr_file_sources: Vec<FileSource>,
    #[serde(default)]
    pub rules: RcvRules,
}

pub fn read_config(path: &str) -> RcvResult<RcvConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RcvConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> RcvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_summary: {:?}", js);
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> RcvResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None::<usize>.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config() {
        let config: RcvConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RcvConfig::default());
    }

    #[test]
    fn first_vote_row_as_number_or_string() {
        let config: RcvConfig = serde_json::from_str(
            r#"{"cvrFileSources": [
                {"provider": "csv", "filePath": "a.csv", "firstVoteRowIndex": 2},
                {"provider": "csv", "filePath": "b.csv", "firstVoteRowIndex": "3"},
                {"provider": "csv", "filePath": "c.csv"},
                {"provider": "csv", "filePath": "d.csv", "firstVoteRowIndex": "x"}
            ]}"#,
        )
        .unwrap();
        let rows: Vec<Option<usize>> = config
            .cvr_file_sources
            .iter()
            .map(|s| s.first_vote_row_index().ok())
            .collect();
        assert_eq!(rows, vec![Some(2), Some(3), Some(1), None]);
    }

    #[test]
    fn zero_row_is_rejected() {
        assert!(FileSource::csv("a.csv", Some(0)).first_vote_row_index().is_err());
        assert_eq!(FileSource::csv("a.csv", Some(4)).first_vote_row_index().ok(), Some(4));
    }
}

use crate::rla::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ContestConfig {
    pub name: String,
    #[serde(rename = "universeSize")]
    pub universe_size: u64,
    /// The candidates, in the order used by the assertion generator.
    pub candidates: Vec<String>,
}

/// An assertion, as returned by the assertion generator.
///
/// Candidates are referred to by their index in the list of candidates.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RaireAssertion {
    #[serde(rename = "type")]
    pub assertion_type: String,
    pub winner: usize,
    pub loser: usize,
    /// Empty or absent for NEB assertions.
    pub continuing: Option<Vec<usize>>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AssertionResult {
    pub margin: u64,
    pub difficulty: f64,
    pub assertion: RaireAssertion,
}

/// One side of an audited ballot: the machine record or the audit board entry.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    #[serde(rename = "recordType")]
    pub record_type: String,
    /// The raw marks for the contest, e.g. `["Alice(1)", "Bob(2)"]`.
    /// Absent if the contest is not on this ballot.
    pub choices: Option<Vec<String>>,
    pub consensus: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AuditedBallotConfig {
    #[serde(rename = "cvrId")]
    pub cvr_id: u64,
    pub cvr: RecordConfig,
    pub acvr: RecordConfig,
    /// The number of times this ballot was selected in the sample. Default 1.
    pub multiplicity: Option<u64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub contest: ContestConfig,
    #[serde(rename = "riskLimit")]
    pub risk_limit: Option<f64>,
    pub gamma: Option<f64>,
    pub assertions: Vec<AssertionResult>,
    #[serde(rename = "auditedBallots")]
    pub audited_ballots: Vec<AuditedBallotConfig>,
}

pub fn read_config(path: &str) -> RlaResult<AuditConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    let config: AuditConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> RlaResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu {
        path: path.to_string(),
    })?;
    debug!("read_summary: content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

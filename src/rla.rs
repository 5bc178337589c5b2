use log::{debug, info, warn};

use irv_audit::builder::Builder;
use irv_audit::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
pub mod io_ballots;
pub mod io_common;

use crate::rla::config_reader::*;
use crate::rla::io_ballots::*;

#[derive(Debug, Snafu)]
pub enum RlaError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening ballot file {path}"))]
    OpeningBallots {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot read the ballot of record {cvr_id}: {source}"))]
    ParsingBallot { source: AuditErrors, cvr_id: u64 },
    #[snafu(display("Candidate index {index} is out of range ({num_candidates} candidates)"))]
    UnknownCandidate { index: usize, num_candidates: usize },
    #[snafu(display("Cannot set up the audit: {source}"))]
    Audit { source: AuditErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RlaResult<T> = Result<T, RlaError>;

fn candidate_name(candidates: &[String], index: usize) -> RlaResult<String> {
    candidates
        .get(index)
        .cloned()
        .context(UnknownCandidateSnafu {
            index,
            num_candidates: candidates.len(),
        })
}

fn validate_parameters(config: &AuditConfig, risk_limit: Option<f64>) -> RlaResult<AuditParameters> {
    let defaults = AuditParameters::DEFAULT_PARAMETERS;
    let res = AuditParameters {
        risk_limit: risk_limit
            .or(config.risk_limit)
            .unwrap_or(defaults.risk_limit),
        gamma: config.gamma.unwrap_or(defaults.gamma),
    };
    if !(res.risk_limit > 0.0 && res.risk_limit < 1.0) {
        whatever!("The risk limit must be between 0 and 1, got {}", res.risk_limit)
    }
    if res.gamma <= 1.0 {
        whatever!("Gamma must be greater than 1, got {}", res.gamma)
    }
    Ok(res)
}

/// Assembles the audit of the contest from the assertions of the generator.
pub fn build_audit(config: &AuditConfig, risk_limit: Option<f64>) -> RlaResult<ContestAudit> {
    let parameters = validate_parameters(config, risk_limit)?;
    let contest = &config.contest;
    let mut builder = Builder::new(&parameters, &contest.name, contest.universe_size)
        .context(AuditSnafu {})?
        .candidates(&contest.candidates)
        .context(AuditSnafu {})?;

    for ar in config.assertions.iter() {
        let a = &ar.assertion;
        let winner = candidate_name(&contest.candidates, a.winner)?;
        let loser = candidate_name(&contest.candidates, a.loser)?;
        match a.assertion_type.as_str() {
            "NEB" => {
                builder
                    .add_neb(&winner, &loser, ar.margin, ar.difficulty)
                    .context(AuditSnafu {})?;
            }
            "NEN" => {
                let continuing: Vec<String> = a
                    .continuing
                    .clone()
                    .unwrap_or_default()
                    .iter()
                    .map(|idx| candidate_name(&contest.candidates, *idx))
                    .collect::<RlaResult<_>>()?;
                builder
                    .add_nen(&winner, &loser, ar.margin, ar.difficulty, &continuing)
                    .context(AuditSnafu {})?;
            }
            x => {
                whatever!("Unknown assertion type {:?}", x)
            }
        }
    }
    Ok(builder.build())
}

/// Reads one side of an audited ballot. The raw marks are replaced by their
/// valid interpretation.
fn build_record(contest_name: &str, cvr_id: u64, rc: &RecordConfig) -> RlaResult<CastVoteRecord> {
    let record_type = match rc.record_type.as_str() {
        "UPLOADED" => RecordType::Uploaded,
        "AUDITOR_ENTERED" => RecordType::AuditorEntered,
        "REAUDITED" => RecordType::Reaudited,
        "PHANTOM_RECORD" => RecordType::PhantomRecord,
        "PHANTOM_BALLOT" => RecordType::PhantomBallot,
        x => {
            whatever!("Unknown record type {:?} for record {}", x, cvr_id)
        }
    };
    let consensus = match rc.consensus.as_deref() {
        None => None,
        Some("YES") => Some(ConsensusValue::Yes),
        Some("NO") => Some(ConsensusValue::No),
        Some(x) => {
            whatever!("Unknown consensus value {:?} for record {}", x, cvr_id)
        }
    };
    let contest_info = match &rc.choices {
        None => vec![],
        Some(marks) => {
            let ballot = RankedBallot::parse_tokens(marks).context(ParsingBallotSnafu { cvr_id })?;
            let choices = ballot.valid_intent();
            if !ballot.is_valid() {
                info!(
                    "build_record: record {}: invalid ballot {} interpreted as {:?}",
                    cvr_id, ballot, choices
                );
            }
            vec![CvrContestInfo {
                contest_name: contest_name.to_string(),
                choices,
                consensus,
            }]
        }
    };
    Ok(CastVoteRecord {
        id: cvr_id,
        record_type,
        contest_info,
    })
}

fn assertion_to_json(a: &Assertion) -> JSValue {
    let c = a.counts();
    let mut js = json!({
        "type": a.rule.short_name(),
        "winner": a.winner,
        "loser": a.loser,
        "margin": a.margin,
        "dilutedMargin": a.diluted_margin,
        "difficulty": a.difficulty,
        "discrepancies": {
            "twoUnder": c.two_under,
            "oneUnder": c.one_under,
            "other": c.other,
            "oneOver": c.one_over,
            "twoOver": c.two_over,
        },
        "optimisticSamplesToAudit": a.optimistic_samples_to_audit(),
        "estimatedSamplesToAudit": a.estimated_samples_to_audit(),
        "risk": a.current_risk(),
    });
    if let AssertionRule::NotEliminatedNext { assumed_continuing } = &a.rule {
        js["assumedContinuing"] = json!(assumed_continuing);
    }
    js
}

fn build_summary_js(audit: &ContestAudit, risk: f64, ballots: Vec<JSValue>) -> JSValue {
    let assertions: Vec<JSValue> = audit.assertions().iter().map(assertion_to_json).collect();
    json!({
        "contest": audit.contest_name,
        "riskLimit": audit.parameters.risk_limit,
        "gamma": audit.parameters.gamma,
        "auditedSampleCount": audit.audited_sample_count(),
        "results": {
            "optimisticSamplesToAudit": audit.optimistic_samples_to_audit(),
            "estimatedSamplesToAudit": audit.estimated_samples_to_audit(),
            "risk": risk,
            "riskLimitAchieved": audit.risk_limit_achieved(),
            "dilutedMargin": audit.diluted_margin(),
            "minMargin": audit.min_margin(),
        },
        "assertions": assertions,
        "ballots": ballots,
    })
}

/// Runs the audit described in the configuration and returns its summary.
pub fn audit_summary(config: &AuditConfig, risk_limit: Option<f64>) -> RlaResult<JSValue> {
    let mut audit = build_audit(config, risk_limit)?;
    info!(
        "audit_summary: contest {}: {} assertions, {} audited ballots",
        audit.contest_name,
        audit.assertions().len(),
        config.audited_ballots.len()
    );
    if !audit.is_auditable() {
        warn!(
            "audit_summary: contest {} cannot be audited (diluted margin {})",
            audit.contest_name,
            audit.diluted_margin()
        );
    }

    let mut ballots: Vec<JSValue> = Vec::new();
    for ab in config.audited_ballots.iter() {
        let cvr = build_record(&audit.contest_name, ab.cvr_id, &ab.cvr)?;
        let acvr = build_record(&audit.contest_name, ab.cvr_id, &ab.acvr)?;
        let multiplicity = ab.multiplicity.unwrap_or(1);
        let d = audit.compute_discrepancy(&cvr, &acvr);
        for _ in 0..multiplicity {
            audit.record_discrepancy(ab.cvr_id);
        }
        audit.add_audited_samples(multiplicity);
        ballots.push(json!({
            "cvrId": ab.cvr_id,
            "multiplicity": multiplicity,
            "discrepancy": d.map(|x| x.value()),
        }));
    }

    audit.recalculate_samples_to_audit();
    let risk = audit.update_risk_measurement();
    for a in audit.assertions() {
        debug!("audit_summary: {}", a.description());
    }
    Ok(build_summary_js(&audit, risk, ballots))
}

/// The validity and the valid interpretation of each raw ballot.
pub fn interpretation_summary(ballots: &[RawBallot]) -> JSValue {
    let mut entries: Vec<JSValue> = Vec::new();
    let mut num_invalid = 0;
    let mut num_unreadable = 0;
    for b in ballots {
        match RankedBallot::parse(&b.raw) {
            Ok(ballot) => {
                let valid = ballot.is_valid();
                if !valid {
                    num_invalid += 1;
                }
                entries.push(json!({
                    "id": b.id,
                    "raw": b.raw,
                    "valid": valid,
                    "interpretation": ballot.valid_intent(),
                }));
            }
            Err(e) => {
                warn!("interpretation_summary: ballot {}: {}", b.id, e);
                num_unreadable += 1;
                entries.push(json!({
                    "id": b.id,
                    "raw": b.raw,
                    "error": e.to_string(),
                }));
            }
        }
    }
    info!(
        "interpretation_summary: {} ballots, {} invalid, {} unreadable",
        ballots.len(),
        num_invalid,
        num_unreadable
    );
    json!({
        "numInvalid": num_invalid,
        "numUnreadable": num_unreadable,
        "ballots": entries,
    })
}

fn write_output(pretty_js: &str, out: &Option<String>) -> RlaResult<()> {
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js);
        }
        Some(path) => {
            fs::write(path, pretty_js).context(WritingOutputSnafu {
                path: path.to_string(),
            })?;
            info!("write_output: summary written to {}", path);
        }
    }
    Ok(())
}

fn check_reference(pretty_js_stats: &str, summary_path: &str) -> RlaResult<()> {
    let summary_ref = read_summary(summary_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

pub fn run_audit(
    config_path: &str,
    check_summary_path: &Option<String>,
    out: &Option<String>,
    risk_limit: Option<f64>,
) -> RlaResult<()> {
    let config = read_config(config_path)?;
    debug!("run_audit: config: {:?}", config);

    let result_js = audit_summary(&config, risk_limit)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_output(&pretty_js_stats, out)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        check_reference(&pretty_js_stats, summary_p)?;
    }
    Ok(())
}

pub fn run_interpretation(input_path: &str, out: &Option<String>) -> RlaResult<()> {
    let ballots = read_ballots(input_path)?;
    let result_js = interpretation_summary(&ballots);
    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_output(&pretty_js, out)
}

/*!
Assertions and the discrepancies found against them.

An assertion is a pairwise claim about an instant-runoff contest, produced
by an external assertion generator. If all the assertions of a contest
hold, the reported winner is correct. During the audit, each sampled
ballot is compared with its machine record, and the difference is scored
for every assertion of the contest.
*/

use std::collections::HashMap;
use std::fmt::Display;

use log::{debug, error, info};

use crate::audit_math::{optimistic, p_value_approximation, round_risk, scaled_estimate};
use crate::config::*;

/// How a single audited ballot affects an assertion.
///
/// Understatements favour the reported outcome, overstatements go against it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Discrepancy {
    TwoUnder,
    OneUnder,
    /// A difference in interpretation that does not matter for the assertion.
    Other,
    OneOver,
    TwoOver,
}

impl Discrepancy {
    pub fn value(&self) -> i64 {
        match self {
            Discrepancy::TwoUnder => -2,
            Discrepancy::OneUnder => -1,
            Discrepancy::Other => 0,
            Discrepancy::OneOver => 1,
            Discrepancy::TwoOver => 2,
        }
    }

    pub fn from_value(value: i64) -> Option<Discrepancy> {
        match value {
            -2 => Some(Discrepancy::TwoUnder),
            -1 => Some(Discrepancy::OneUnder),
            0 => Some(Discrepancy::Other),
            1 => Some(Discrepancy::OneOver),
            2 => Some(Discrepancy::TwoOver),
            _ => None,
        }
    }
}

impl Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// The number of recorded discrepancies of each type.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub struct DiscrepancyCounts {
    pub two_under: u64,
    pub one_under: u64,
    pub other: u64,
    pub one_over: u64,
    pub two_over: u64,
}

impl DiscrepancyCounts {
    pub const EMPTY: DiscrepancyCounts = DiscrepancyCounts {
        two_under: 0,
        one_under: 0,
        other: 0,
        one_over: 0,
        two_over: 0,
    };

    pub fn get(&self, d: Discrepancy) -> u64 {
        match d {
            Discrepancy::TwoUnder => self.two_under,
            Discrepancy::OneUnder => self.one_under,
            Discrepancy::Other => self.other,
            Discrepancy::OneOver => self.one_over,
            Discrepancy::TwoOver => self.two_over,
        }
    }

    /// One- and two-vote overstatements.
    pub fn overstatements(&self) -> u64 {
        self.one_over + self.two_over
    }

    fn counter_mut(&mut self, d: Discrepancy) -> &mut u64 {
        match d {
            Discrepancy::TwoUnder => &mut self.two_under,
            Discrepancy::OneUnder => &mut self.one_under,
            Discrepancy::Other => &mut self.other,
            Discrepancy::OneOver => &mut self.one_over,
            Discrepancy::TwoOver => &mut self.two_over,
        }
    }

    fn increment(&mut self, d: Discrepancy) {
        *self.counter_mut(d) += 1;
    }

    fn decrement(&mut self, d: Discrepancy) {
        let c = self.counter_mut(d);
        assert!(*c > 0, "decrement: no discrepancy of type {} to remove", d);
        *c -= 1;
    }
}

/// The rule under which an assertion compares its winner and loser.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum AssertionRule {
    /// Not eliminated before: the winner has more first preferences than the
    /// loser ever gets.
    NotEliminatedBefore,
    /// Not eliminated next: when only the candidates in `assumed_continuing`
    /// remain, the winner is not the next one eliminated.
    NotEliminatedNext { assumed_continuing: Vec<String> },
}

impl AssertionRule {
    pub fn short_name(&self) -> &'static str {
        match self {
            AssertionRule::NotEliminatedBefore => "NEB",
            AssertionRule::NotEliminatedNext { .. } => "NEN",
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Assertion {
    pub contest_name: String,
    pub winner: String,
    pub loser: String,
    pub margin: u64,
    /// The margin divided by the number of ballots in the universe of the contest.
    pub diluted_margin: f64,
    /// As estimated by the assertion generator. Not used by the audit itself.
    pub difficulty: f64,
    pub rule: AssertionRule,
    cvr_discrepancy: HashMap<CvrId, Discrepancy>,
    counts: DiscrepancyCounts,
    optimistic_samples_to_audit: u64,
    estimated_samples_to_audit: u64,
    current_risk: f64,
}

impl Assertion {
    /// Creates an assertion. The universe size is the number of ballots that may
    /// contain the contest, and must not be zero.
    pub fn new(
        contest_name: &str,
        winner: &str,
        loser: &str,
        margin: u64,
        universe_size: u64,
        difficulty: f64,
        rule: AssertionRule,
    ) -> Result<Assertion, AuditErrors> {
        if universe_size == 0 {
            return Err(AuditErrors::ZeroUniverseSize {
                contest: contest_name.to_string(),
            });
        }
        Ok(Assertion {
            contest_name: contest_name.to_string(),
            winner: winner.to_string(),
            loser: loser.to_string(),
            margin,
            diluted_margin: margin as f64 / universe_size as f64,
            difficulty,
            rule,
            cvr_discrepancy: HashMap::new(),
            counts: DiscrepancyCounts::EMPTY,
            optimistic_samples_to_audit: 0,
            estimated_samples_to_audit: 0,
            current_risk: 1.0,
        })
    }

    pub fn new_neb(
        contest_name: &str,
        winner: &str,
        loser: &str,
        margin: u64,
        universe_size: u64,
        difficulty: f64,
    ) -> Result<Assertion, AuditErrors> {
        Assertion::new(
            contest_name,
            winner,
            loser,
            margin,
            universe_size,
            difficulty,
            AssertionRule::NotEliminatedBefore,
        )
    }

    pub fn new_nen(
        contest_name: &str,
        winner: &str,
        loser: &str,
        margin: u64,
        universe_size: u64,
        difficulty: f64,
        assumed_continuing: &[String],
    ) -> Result<Assertion, AuditErrors> {
        Assertion::new(
            contest_name,
            winner,
            loser,
            margin,
            universe_size,
            difficulty,
            AssertionRule::NotEliminatedNext {
                assumed_continuing: assumed_continuing.to_vec(),
            },
        )
    }

    pub fn counts(&self) -> DiscrepancyCounts {
        self.counts
    }

    pub fn discrepancy_for(&self, cvr_id: CvrId) -> Option<Discrepancy> {
        self.cvr_discrepancy.get(&cvr_id).cloned()
    }

    pub fn optimistic_samples_to_audit(&self) -> u64 {
        self.optimistic_samples_to_audit
    }

    pub fn estimated_samples_to_audit(&self) -> u64 {
        self.estimated_samples_to_audit
    }

    pub fn current_risk(&self) -> f64 {
        self.current_risk
    }

    /// The score of a vote for this assertion: 1 if it supports the winner,
    /// -1 if it supports the loser, 0 otherwise.
    ///
    /// `choices` is the valid interpretation of the vote, most preferred first.
    pub fn score(&self, choices: &[String]) -> i64 {
        let res = match &self.rule {
            AssertionRule::NotEliminatedBefore => {
                let winner_idx = choices.iter().position(|c| *c == self.winner);
                let loser_idx = choices.iter().position(|c| *c == self.loser);
                match (winner_idx, loser_idx) {
                    (Some(0), _) => 1,
                    (None, Some(_)) => -1,
                    (Some(w), Some(l)) if l < w => -1,
                    _ => 0,
                }
            }
            AssertionRule::NotEliminatedNext { assumed_continuing } => {
                match choices.iter().find(|c| assumed_continuing.contains(*c)) {
                    Some(c) if *c == self.winner => 1,
                    Some(c) if *c == self.loser => -1,
                    _ => 0,
                }
            }
        };
        debug!(
            "score: {} {} {}: {:?} -> {}",
            self.winner,
            self.rule.short_name(),
            self.loser,
            choices,
            res
        );
        res
    }

    /// Compares a machine record with the corresponding audited ballot.
    ///
    /// The discrepancy found (if any) is kept for the record id, replacing any
    /// previous one. It is not counted until `record_discrepancy` is called.
    pub fn compute_discrepancy(
        &mut self,
        cvr: &CastVoteRecord,
        audited: &CastVoteRecord,
    ) -> Option<Discrepancy> {
        let cvr_info = cvr.contest_info_for(&self.contest_name);
        let acvr_info = audited.contest_info_for(&self.contest_name);

        let value: Option<i64> = if audited.record_type.is_phantom_ballot() {
            if cvr.record_type.is_phantom_record() {
                debug!("compute_discrepancy: phantom ballot, phantom record");
                Some(2)
            } else {
                debug!("compute_discrepancy: phantom ballot");
                Some(cvr_info.map(|ci| 1 + self.score(&ci.choices)).unwrap_or(1))
            }
        } else if cvr.record_type.is_phantom_record() {
            debug!("compute_discrepancy: phantom record");
            match acvr_info {
                Some(ai) if ai.consensus == Some(ConsensusValue::Yes) => {
                    Some(1 - self.score(&ai.choices))
                }
                _ => Some(2),
            }
        } else {
            match (cvr_info, acvr_info) {
                (Some(ci), Some(ai)) if ai.consensus == Some(ConsensusValue::No) => {
                    debug!("compute_discrepancy: no consensus, treated as a phantom ballot");
                    Some(1 + self.score(&ci.choices))
                }
                (Some(ci), Some(ai)) if ci.choices == ai.choices => None,
                (Some(ci), Some(ai)) => Some(self.score(&ci.choices) - self.score(&ai.choices)),
                _ => None,
            }
        };

        let res = value.map(|v| match Discrepancy::from_value(v) {
            Some(d) => d,
            None => {
                error!("compute_discrepancy: discrepancy out of range: {}", v);
                panic!("compute_discrepancy: discrepancy out of range: {}", v)
            }
        });

        match res {
            Some(d) => {
                info!(
                    "compute_discrepancy: cvr {}, contest {}, {} {} {}: discrepancy {}",
                    cvr.id,
                    self.contest_name,
                    self.winner,
                    self.rule.short_name(),
                    self.loser,
                    d
                );
                self.cvr_discrepancy.insert(cvr.id, d);
            }
            None => {
                info!(
                    "compute_discrepancy: cvr {}, contest {}, {} {} {}: no discrepancy",
                    cvr.id,
                    self.contest_name,
                    self.winner,
                    self.rule.short_name(),
                    self.loser
                );
                self.cvr_discrepancy.remove(&cvr.id);
            }
        }
        res
    }

    /// Counts the discrepancy computed for this record, if there is one.
    ///
    /// Returns the discrepancy that was counted.
    pub fn record_discrepancy(&mut self, cvr_id: CvrId) -> Option<Discrepancy> {
        match self.cvr_discrepancy.get(&cvr_id).cloned() {
            Some(d) => {
                self.counts.increment(d);
                debug!(
                    "record_discrepancy: cvr {}: {} added, counts: {:?}",
                    cvr_id, d, self.counts
                );
                Some(d)
            }
            None => {
                debug!("record_discrepancy: no discrepancy for cvr {}", cvr_id);
                None
            }
        }
    }

    /// Removes a counted discrepancy for this record, for example when the
    /// ballot is going to be audited again.
    ///
    /// Returns the discrepancy that was removed.
    pub fn remove_discrepancy(&mut self, cvr_id: CvrId) -> Option<Discrepancy> {
        match self.cvr_discrepancy.remove(&cvr_id) {
            Some(d) => {
                if self.counts.get(d) == 0 {
                    error!(
                        "remove_discrepancy: contest {}: cvr {} has discrepancy {} but none is counted",
                        self.contest_name, cvr_id, d
                    );
                }
                self.counts.decrement(d);
                debug!(
                    "remove_discrepancy: cvr {}: {} removed, counts: {:?}",
                    cvr_id, d, self.counts
                );
                Some(d)
            }
            None => {
                debug!("remove_discrepancy: no discrepancy for cvr {}", cvr_id);
                None
            }
        }
    }

    /// Replaces the discrepancy state with previously saved values.
    ///
    /// Every stored type must be in -2..=2.
    pub fn restore_discrepancies(
        &mut self,
        entries: &[(CvrId, i64)],
        counts: DiscrepancyCounts,
    ) -> Result<(), AuditErrors> {
        let mut restored: HashMap<CvrId, Discrepancy> = HashMap::new();
        for (cvr_id, value) in entries {
            let d = Discrepancy::from_value(*value).ok_or(AuditErrors::InvalidDiscrepancy {
                cvr_id: *cvr_id,
                value: *value,
            })?;
            restored.insert(*cvr_id, d);
        }
        self.cvr_discrepancy = restored;
        self.counts = counts;
        Ok(())
    }

    /// The discrepancy state, sorted by record id, in the format accepted by
    /// `restore_discrepancies`.
    pub fn stored_discrepancies(&self) -> Vec<(CvrId, i64)> {
        let mut res: Vec<(CvrId, i64)> = self
            .cvr_discrepancy
            .iter()
            .map(|(id, d)| (*id, d.value()))
            .collect();
        res.sort();
        res
    }

    /// The minimum total number of ballots to audit, assuming that no more
    /// overstatements will be found.
    pub fn compute_optimistic_samples_to_audit(&mut self, risk_limit: f64, gamma: f64) -> u64 {
        let c = &self.counts;
        self.optimistic_samples_to_audit = optimistic(
            risk_limit,
            self.diluted_margin,
            gamma,
            c.two_under,
            c.one_under,
            c.one_over,
            c.two_over,
        );
        debug!(
            "compute_optimistic_samples_to_audit: {} {} {}: {}",
            self.winner,
            self.rule.short_name(),
            self.loser,
            self.optimistic_samples_to_audit
        );
        self.optimistic_samples_to_audit
    }

    /// The optimistic sample size before any ballot is audited, i.e. with no
    /// discrepancies. The counts of this assertion are ignored.
    pub fn compute_initial_optimistic_samples_to_audit(&self, risk_limit: f64, gamma: f64) -> u64 {
        optimistic(risk_limit, self.diluted_margin, gamma, 0, 0, 0, 0)
    }

    /// The optimistic sample size, scaled up by the rate of overstatements
    /// observed so far.
    pub fn compute_estimated_samples_to_audit(
        &mut self,
        risk_limit: f64,
        gamma: f64,
        audited_sample_count: u64,
    ) -> u64 {
        let optimistic = self.compute_optimistic_samples_to_audit(risk_limit, gamma);
        let overstatements = self.counts.overstatements();
        self.estimated_samples_to_audit = if overstatements == 0 {
            optimistic
        } else {
            scaled_estimate(optimistic, audited_sample_count, overstatements)
        };
        debug!(
            "compute_estimated_samples_to_audit: {} {} {}: {} overstatements, {}",
            self.winner,
            self.rule.short_name(),
            self.loser,
            overstatements,
            self.estimated_samples_to_audit
        );
        self.estimated_samples_to_audit
    }

    /// The risk that this assertion is wrong, given the discrepancies counted
    /// in `audited_sample_count` ballots. Rounded to 3 decimals.
    ///
    /// It is 1 when nothing has been audited or the diluted margin is 0.
    pub fn risk_measurement(&self, audited_sample_count: u64, gamma: f64) -> f64 {
        if audited_sample_count > 0 && self.diluted_margin > 0.0 {
            let c = &self.counts;
            let p = p_value_approximation(
                audited_sample_count,
                self.diluted_margin,
                gamma,
                c.one_under,
                c.two_under,
                c.one_over,
                c.two_over,
            );
            round_risk(p)
        } else {
            1.0
        }
    }

    pub fn update_risk_measurement(&mut self, audited_sample_count: u64, gamma: f64) -> f64 {
        self.current_risk = self.risk_measurement(audited_sample_count, gamma);
        self.current_risk
    }

    /// A one-line summary of this assertion and its audit state.
    pub fn description(&self) -> String {
        let continuing = match &self.rule {
            AssertionRule::NotEliminatedBefore => String::new(),
            AssertionRule::NotEliminatedNext { assumed_continuing } => {
                format!(" assuming [{}] continuing", assumed_continuing.join(", "))
            }
        };
        let c = &self.counts;
        format!(
            "{}: {} {} {}{}, margin {} (diluted {:.4}), discrepancies -2:{} -1:{} 0:{} 1:{} 2:{}, \
             optimistic {}, estimated {}, risk {}",
            self.contest_name,
            self.winner,
            self.rule.short_name(),
            self.loser,
            continuing,
            self.margin,
            self.diluted_margin,
            c.two_under,
            c.one_under,
            c.other,
            c.one_over,
            c.two_over,
            self.optimistic_samples_to_audit,
            self.estimated_samples_to_audit,
            self.current_risk
        )
    }
}

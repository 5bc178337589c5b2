use log::{debug, info};

use crate::assertion::{Assertion, Discrepancy};
use crate::config::*;

/// The comparison audit of one instant-runoff contest.
///
/// The contest outcome is confirmed when all of its assertions are, so the
/// audit-level quantities are the worst values over the assertions.
#[derive(PartialEq, Debug, Clone)]
pub struct ContestAudit {
    pub contest_name: String,
    pub universe_size: u64,
    pub parameters: AuditParameters,
    assertions: Vec<Assertion>,
    audited_sample_count: u64,
    optimistic_samples_to_audit: u64,
    estimated_samples_to_audit: u64,
}

impl ContestAudit {
    pub fn new(
        contest_name: &str,
        universe_size: u64,
        parameters: &AuditParameters,
        assertions: Vec<Assertion>,
    ) -> ContestAudit {
        for a in assertions.iter() {
            assert!(
                a.contest_name == contest_name,
                "ContestAudit::new: assertion for contest {:?} added to contest {:?}",
                a.contest_name,
                contest_name
            );
        }
        ContestAudit {
            contest_name: contest_name.to_string(),
            universe_size,
            parameters: *parameters,
            assertions,
            audited_sample_count: 0,
            optimistic_samples_to_audit: 0,
            estimated_samples_to_audit: 0,
        }
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn audited_sample_count(&self) -> u64 {
        self.audited_sample_count
    }

    pub fn optimistic_samples_to_audit(&self) -> u64 {
        self.optimistic_samples_to_audit
    }

    pub fn estimated_samples_to_audit(&self) -> u64 {
        self.estimated_samples_to_audit
    }

    /// A contest can only be audited if every assertion has a positive margin.
    pub fn is_auditable(&self) -> bool {
        self.diluted_margin() > 0.0
    }

    /// The smallest diluted margin of all the assertions, or 0 without assertions.
    pub fn diluted_margin(&self) -> f64 {
        self.assertions
            .iter()
            .map(|a| a.diluted_margin)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// The smallest margin of all the assertions, or 0 without assertions.
    pub fn min_margin(&self) -> u64 {
        self.assertions.iter().map(|a| a.margin).min().unwrap_or(0)
    }

    /// Compares the machine record and the audited ballot for every assertion.
    ///
    /// Returns the largest discrepancy found, if any.
    pub fn compute_discrepancy(
        &mut self,
        cvr: &CastVoteRecord,
        audited: &CastVoteRecord,
    ) -> Option<Discrepancy> {
        let mut res: Option<Discrepancy> = None;
        for a in self.assertions.iter_mut() {
            let d = a.compute_discrepancy(cvr, audited);
            res = res.max(d);
        }
        debug!(
            "compute_discrepancy: contest {}, cvr {}: {:?}",
            self.contest_name, cvr.id, res
        );
        res
    }

    /// Counts the discrepancies of this record in every assertion.
    ///
    /// Returns true if any assertion had one.
    pub fn record_discrepancy(&mut self, cvr_id: CvrId) -> bool {
        let mut found = false;
        for a in self.assertions.iter_mut() {
            found |= a.record_discrepancy(cvr_id).is_some();
        }
        found
    }

    /// Removes the discrepancies of this record from every assertion.
    ///
    /// Returns true if any assertion had one.
    pub fn remove_discrepancy(&mut self, cvr_id: CvrId) -> bool {
        let mut found = false;
        for a in self.assertions.iter_mut() {
            found |= a.remove_discrepancy(cvr_id).is_some();
        }
        found
    }

    /// Adds ballots to the number of audited samples.
    ///
    /// A ballot selected several times in the sample counts once per selection.
    pub fn add_audited_samples(&mut self, count: u64) {
        self.audited_sample_count += count;
    }

    /// The number of ballots to sample when the audit starts, used to plan the
    /// audit. It does not depend on the discrepancies recorded so far.
    ///
    /// 0 without assertions.
    pub fn initial_samples_to_audit(&self) -> u64 {
        let res = self
            .assertions
            .iter()
            .map(|a| {
                a.compute_initial_optimistic_samples_to_audit(
                    self.parameters.risk_limit,
                    self.parameters.gamma,
                )
            })
            .max()
            .unwrap_or(0);
        debug!(
            "initial_samples_to_audit: contest {}: {}",
            self.contest_name, res
        );
        res
    }

    /// Recomputes the sample sizes of every assertion and keeps the largest.
    pub fn recalculate_samples_to_audit(&mut self) {
        let risk_limit = self.parameters.risk_limit;
        let gamma = self.parameters.gamma;
        let audited = self.audited_sample_count;
        let mut optimistic: u64 = 0;
        let mut estimated: u64 = 0;
        for a in self.assertions.iter_mut() {
            // Also updates the optimistic value of the assertion.
            estimated = estimated.max(a.compute_estimated_samples_to_audit(
                risk_limit, gamma, audited,
            ));
            optimistic = optimistic.max(a.optimistic_samples_to_audit());
        }
        self.optimistic_samples_to_audit = optimistic;
        self.estimated_samples_to_audit = estimated;
        info!(
            "recalculate_samples_to_audit: contest {}: optimistic {}, estimated {}",
            self.contest_name, optimistic, estimated
        );
    }

    /// The largest risk over all the assertions, or 1 without assertions.
    pub fn risk_measurement(&self) -> f64 {
        self.assertions
            .iter()
            .map(|a| {
                a.risk_measurement(self.audited_sample_count, self.parameters.gamma)
            })
            .reduce(f64::max)
            .unwrap_or(1.0)
    }

    /// Updates the current risk of every assertion and returns the largest.
    pub fn update_risk_measurement(&mut self) -> f64 {
        let audited = self.audited_sample_count;
        let gamma = self.parameters.gamma;
        let res = self
            .assertions
            .iter_mut()
            .map(|a| a.update_risk_measurement(audited, gamma))
            .reduce(f64::max)
            .unwrap_or(1.0);
        info!(
            "update_risk_measurement: contest {}: {} after {} samples",
            self.contest_name, res, audited
        );
        res
    }

    pub fn risk_limit_achieved(&self) -> bool {
        self.is_auditable() && self.risk_measurement() <= self.parameters.risk_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTEST: &str = "Byron";

    fn names(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    fn record(id: CvrId, record_type: RecordType, choices: &[&str]) -> CastVoteRecord {
        CastVoteRecord {
            id,
            record_type,
            contest_info: vec![CvrContestInfo {
                contest_name: CONTEST.to_string(),
                choices: names(choices),
                consensus: Some(ConsensusValue::Yes),
            }],
        }
    }

    fn params() -> AuditParameters {
        AuditParameters {
            risk_limit: 0.05,
            ..AuditParameters::DEFAULT_PARAMETERS
        }
    }

    fn audit() -> ContestAudit {
        let assertions = vec![
            Assertion::new_neb(CONTEST, "Alice", "Bob", 20, 200, 1.0).unwrap(),
            Assertion::new_nen(
                CONTEST,
                "Alice",
                "Chuan",
                40,
                200,
                1.0,
                &names(&["Alice", "Chuan"]),
            )
            .unwrap(),
        ];
        ContestAudit::new(CONTEST, 200, &params(), assertions)
    }

    #[test]
    fn empty_audit() {
        let mut a = ContestAudit::new(CONTEST, 200, &params(), vec![]);
        assert_eq!(a.diluted_margin(), 0.0);
        assert_eq!(a.min_margin(), 0);
        assert!(!a.is_auditable());
        a.add_audited_samples(10);
        assert_eq!(a.risk_measurement(), 1.0);
        assert_eq!(a.update_risk_measurement(), 1.0);
        a.recalculate_samples_to_audit();
        assert_eq!(a.optimistic_samples_to_audit(), 0);
        assert_eq!(a.estimated_samples_to_audit(), 0);
        assert!(!a.risk_limit_achieved());
    }

    #[test]
    fn margins() {
        let a = audit();
        assert_eq!(a.diluted_margin(), 0.1);
        assert_eq!(a.min_margin(), 20);
        assert!(a.is_auditable());
    }

    #[test]
    fn largest_discrepancy() {
        let mut a = audit();
        // NEB: 0 - 1 = -1. NEN: -1 - 1 = -2.
        let d = a.compute_discrepancy(
            &record(1, RecordType::Uploaded, &["Chuan", "Alice"]),
            &record(1, RecordType::AuditorEntered, &["Alice"]),
        );
        assert_eq!(d, Some(Discrepancy::OneUnder));
        // NEB: 1 - 0 = 1. NEN: 1 - (-1) = 2.
        let d = a.compute_discrepancy(
            &record(2, RecordType::Uploaded, &["Alice"]),
            &record(2, RecordType::AuditorEntered, &["Chuan"]),
        );
        assert_eq!(d, Some(Discrepancy::TwoOver));
        let d = a.compute_discrepancy(
            &record(3, RecordType::Uploaded, &["Alice"]),
            &record(3, RecordType::AuditorEntered, &["Alice"]),
        );
        assert_eq!(d, None);
    }

    #[test]
    fn record_and_remove() {
        let mut a = audit();
        a.compute_discrepancy(
            &record(2, RecordType::Uploaded, &["Alice"]),
            &record(2, RecordType::AuditorEntered, &["Chuan"]),
        );
        assert!(a.record_discrepancy(2));
        assert!(!a.record_discrepancy(3));
        assert_eq!(a.assertions()[0].counts().one_over, 1);
        assert_eq!(a.assertions()[1].counts().two_over, 1);
        assert!(a.remove_discrepancy(2));
        assert!(!a.remove_discrepancy(2));
        assert_eq!(a.assertions()[1].counts().two_over, 0);
    }

    #[test]
    fn initial_samples() {
        let mut a = audit();
        assert_eq!(a.initial_samples_to_audit(), 63);
        a.compute_discrepancy(
            &record(2, RecordType::Uploaded, &["Alice"]),
            &record(2, RecordType::AuditorEntered, &["Chuan"]),
        );
        a.record_discrepancy(2);
        a.add_audited_samples(1);
        a.recalculate_samples_to_audit();
        assert_eq!(a.optimistic_samples_to_audit(), 76);
        assert_eq!(a.initial_samples_to_audit(), 63);

        let empty = ContestAudit::new(CONTEST, 200, &params(), vec![]);
        assert_eq!(empty.initial_samples_to_audit(), 0);
    }

    #[test]
    fn samples_and_risk() {
        let mut a = audit();
        a.recalculate_samples_to_audit();
        // The assertion with the smallest margin decides.
        assert_eq!(a.optimistic_samples_to_audit(), 63);
        assert_eq!(a.estimated_samples_to_audit(), 63);
        assert_eq!(a.risk_measurement(), 1.0);

        a.add_audited_samples(50);
        assert_eq!(a.update_risk_measurement(), 0.085);
        assert_eq!(a.assertions()[0].current_risk(), 0.085);
        assert!(!a.risk_limit_achieved());

        a.add_audited_samples(50);
        assert!(a.risk_limit_achieved());
    }
}

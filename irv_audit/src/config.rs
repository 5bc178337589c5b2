// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use crate::audit_math::GAMMA;

/// The identifier of a cast vote record, as assigned by the upload subsystem.
pub type CvrId = u64;

/// The provenance of a cast vote record.
///
/// Machine records come from the tabulation system. Audited records are
/// entered by the audit board after retrieving the paper ballot.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RecordType {
    /// Uploaded from the tabulation system.
    Uploaded,
    /// Entered by the audit board.
    AuditorEntered,
    /// Entered again by the audit board after a reaudit.
    Reaudited,
    /// A placeholder for a ballot in the manifest with no machine record.
    PhantomRecord,
    /// The audit board could not find the physical ballot.
    PhantomBallot,
}

impl RecordType {
    pub fn is_phantom_record(&self) -> bool {
        *self == RecordType::PhantomRecord
    }

    pub fn is_phantom_ballot(&self) -> bool {
        *self == RecordType::PhantomBallot
    }
}

/// Whether the audit board members agreed on the interpretation of a contest.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ConsensusValue {
    Yes,
    No,
}

/// The choices recorded for one contest on one ballot.
///
/// The choices are the valid interpretation of the ballot, in preference order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CvrContestInfo {
    pub contest_name: String,
    pub choices: Vec<String>,
    pub consensus: Option<ConsensusValue>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CastVoteRecord {
    pub id: CvrId,
    pub record_type: RecordType,
    pub contest_info: Vec<CvrContestInfo>,
}

impl CastVoteRecord {
    /// The contest information for the given contest, if this ballot contains it.
    pub fn contest_info_for(&self, contest_name: &str) -> Option<&CvrContestInfo> {
        self.contest_info
            .iter()
            .find(|ci| ci.contest_name == contest_name)
    }
}

// ******** Errors *********

/// Errors that are reported back to the caller.
///
/// Broken internal invariants (unsorted ballots, counters going below zero)
/// are not represented here: they abort the current operation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AuditErrors {
    /// A token of a ranked ballot does not follow the `name(rank)` pattern.
    ParseFailure { token: String },
    /// The ballot does not have a valid sorted representation.
    InvalidBallot { ballot: String },
    /// An assertion cannot be built for a contest with no ballots.
    ZeroUniverseSize { contest: String },
    /// A stored discrepancy is outside of the range -2..=2.
    InvalidDiscrepancy { cvr_id: CvrId, value: i64 },
}

impl Error for AuditErrors {}

impl Display for AuditErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditErrors::ParseFailure { token } => {
                write!(f, "Couldn't parse candidate-preference: {}", token)
            }
            AuditErrors::InvalidBallot { ballot } => {
                write!(f, "Invalid ballot, cannot be sorted: {}", ballot)
            }
            AuditErrors::ZeroUniverseSize { contest } => {
                write!(f, "Universe size of contest {} is zero", contest)
            }
            AuditErrors::InvalidDiscrepancy { cvr_id, value } => {
                write!(f, "Invalid discrepancy {} stored for cvr {}", value, cvr_id)
            }
        }
    }
}

// ********* Configuration **********

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct AuditParameters {
    /// The risk limit of the audit, in (0, 1).
    pub risk_limit: f64,
    /// The error inflation factor of the comparison audit.
    pub gamma: f64,
}

impl AuditParameters {
    pub const DEFAULT_PARAMETERS: AuditParameters = AuditParameters {
        risk_limit: 0.03,
        gamma: GAMMA,
    };
}

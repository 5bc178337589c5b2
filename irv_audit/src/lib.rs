/*!
Ballot interpretation and risk measurement for the comparison audit of
instant-runoff (IRV) contests.

The crate has two independent parts:

- [`vote`] turns a raw ranked ballot such as `Bob(1),Alice(2),Bob(2)` into its
  valid interpretation (`["Bob", "Alice"]`).
- [`assertion`] and [`contest_audit`] compare machine records with audited
  ballots against the assertions of a contest, count the discrepancies and
  compute the number of ballots left to audit and the current risk.

The assertions themselves are produced by an external assertion generator.
The [`builder::Builder`] is the simplest way to assemble them into an audit.

See the [`manual`] for the command line driver and its input format.
*/

pub mod assertion;
pub mod audit_math;
pub mod builder;
mod config;
pub mod contest_audit;
pub mod manual;
pub mod vote;

pub use crate::assertion::{Assertion, AssertionRule, Discrepancy, DiscrepancyCounts};
pub use crate::config::*;
pub use crate::contest_audit::ContestAudit;
pub use crate::vote::{Preference, RankedBallot};

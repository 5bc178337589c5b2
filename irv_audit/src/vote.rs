/*!
Ranked ballots and their valid interpretation.

A raw ballot is a list of `name(rank)` marks, as recorded by a tabulation
system or by an audit board. Raw ballots may repeat candidates, skip ranks
or put several candidates at the same rank. The valid interpretation
of a ballot follows the Colorado rules for instant-runoff voting:

1. a candidate ranked several times only keeps its most preferred rank
2. an overvote (two candidates sharing a rank) ends the ballot before that rank
3. a skipped rank ends the ballot after the last consecutive rank

The duplicate rule is applied first because removing a duplicate can
open or close a skip.
*/

use std::collections::HashSet;
use std::fmt::Display;

use log::debug;

use crate::config::AuditErrors;

/// A single mark on a ranked ballot.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Preference {
    pub rank: u32,
    pub candidate: String,
}

impl Preference {
    pub fn new(rank: u32, candidate: &str) -> Preference {
        Preference {
            rank,
            candidate: candidate.to_string(),
        }
    }

    /// Parses a mark of the form `name(rank)`.
    ///
    /// Only the last parenthesised group is the rank: `Henry(8) (10)` is
    /// the candidate `Henry(8)` at rank 10. Whitespace around the name and
    /// inside the parentheses is ignored.
    ///
    /// ```
    /// use irv_audit::vote::Preference;
    ///
    /// let p = Preference::parse("  Henry (  10  ) ")?;
    /// assert_eq!(p, Preference::new(10, "Henry"));
    /// assert!(Preference::parse("Henry(0)").is_err());
    /// # Ok::<(), irv_audit::AuditErrors>(())
    /// ```
    pub fn parse(token: &str) -> Result<Preference, AuditErrors> {
        let failure = || AuditErrors::ParseFailure {
            token: token.to_string(),
        };
        let trimmed = token.trim();
        let body = trimmed.strip_suffix(')').ok_or_else(failure)?;
        let open = body.rfind('(').ok_or_else(failure)?;
        let digits = body[open + 1..].trim();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(failure());
        }
        let rank = digits.parse::<u32>().map_err(|_| failure())?;
        let candidate = body[..open].trim();
        if rank == 0 || candidate.is_empty() {
            return Err(failure());
        }
        Ok(Preference::new(rank, candidate))
    }
}

impl Display for Preference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.candidate, self.rank)
    }
}

/// The marks of a ballot for one contest, sorted by rank.
///
/// Marks with the same rank keep the order in which they were given.
/// A ranked ballot is not necessarily valid: see `is_valid`.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct RankedBallot {
    // Invariant: sorted by non-decreasing rank.
    preferences: Vec<Preference>,
}

impl RankedBallot {
    pub fn new(preferences: &[Preference]) -> RankedBallot {
        let mut preferences = preferences.to_vec();
        // Stable sort
        preferences.sort_by_key(|p| p.rank);
        RankedBallot { preferences }
    }

    /// Parses a comma-separated list of marks, e.g. `Alice(1),Bob(2)`.
    ///
    /// A blank string is an empty ballot. Trailing commas are ignored.
    pub fn parse(raw: &str) -> Result<RankedBallot, AuditErrors> {
        if raw.trim().is_empty() {
            return Ok(RankedBallot::default());
        }
        let mut tokens: Vec<&str> = raw.split(',').collect();
        while tokens.last() == Some(&"") {
            tokens.pop();
        }
        RankedBallot::parse_tokens(&tokens)
    }

    /// Parses a list of marks, one mark per element.
    pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<RankedBallot, AuditErrors> {
        let preferences: Vec<Preference> = tokens
            .iter()
            .map(|t| Preference::parse(t.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(RankedBallot::new(&preferences))
    }

    /// A valid ballot with the candidates ranked from 1 in the given order.
    pub fn from_ordered_candidates(candidates: &[String]) -> RankedBallot {
        let preferences: Vec<Preference> = candidates
            .iter()
            .enumerate()
            .map(|(idx, name)| Preference::new((idx + 1) as u32, name))
            .collect();
        RankedBallot { preferences }
    }

    pub fn preferences(&self) -> &[Preference] {
        &self.preferences
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }

    /// True if the ranks are exactly 1..n and no candidate appears twice.
    ///
    /// This does not check the names against the candidates of a contest.
    pub fn is_valid(&self) -> bool {
        let ranks_ok = self
            .preferences
            .iter()
            .enumerate()
            .all(|(idx, p)| p.rank as usize == idx + 1);
        let mut seen: HashSet<&str> = HashSet::new();
        let names_ok = self
            .preferences
            .iter()
            .all(|p| seen.insert(p.candidate.as_str()));
        ranks_ok && names_ok
    }

    /// The candidate names in preference order, for a valid ballot only.
    pub fn as_sorted_list(&self) -> Result<Vec<String>, AuditErrors> {
        if !self.is_valid() {
            return Err(AuditErrors::InvalidBallot {
                ballot: self.to_string(),
            });
        }
        Ok(self.candidate_names())
    }

    /// The valid interpretation of this ballot, as a list of candidate names
    /// in preference order.
    pub fn valid_intent(&self) -> Vec<String> {
        let res = self
            .remove_duplicates()
            .remove_overvotes()
            .remove_skips()
            .candidate_names();
        debug!("valid_intent: {} -> {:?}", self, res);
        res
    }

    /// Keeps only the most preferred mark of each candidate.
    pub fn remove_duplicates(&self) -> RankedBallot {
        self.check_sorted("remove_duplicates");
        let mut seen: HashSet<&str> = HashSet::new();
        let preferences: Vec<Preference> = self
            .preferences
            .iter()
            .filter(|p| seen.insert(p.candidate.as_str()))
            .cloned()
            .collect();
        RankedBallot { preferences }
    }

    /// Drops everything from the first rank shared by two marks.
    pub fn remove_overvotes(&self) -> RankedBallot {
        self.check_sorted("remove_overvotes");
        let end = self
            .preferences
            .windows(2)
            .position(|w| w[0].rank == w[1].rank)
            .unwrap_or(self.preferences.len());
        RankedBallot {
            preferences: self.preferences[..end].to_vec(),
        }
    }

    /// Drops everything after the first skipped rank.
    ///
    /// A ballot that does not start at rank 1 is empty.
    pub fn remove_skips(&self) -> RankedBallot {
        self.check_sorted("remove_skips");
        match self.preferences.first() {
            Some(p) if p.rank == 1 => {}
            _ => return RankedBallot::default(),
        }
        let end = self
            .preferences
            .windows(2)
            .position(|w| w[1].rank - w[0].rank > 1)
            .map(|idx| idx + 1)
            .unwrap_or(self.preferences.len());
        RankedBallot {
            preferences: self.preferences[..end].to_vec(),
        }
    }

    fn candidate_names(&self) -> Vec<String> {
        self.preferences
            .iter()
            .map(|p| p.candidate.clone())
            .collect()
    }

    fn check_sorted(&self, rule: &str) {
        assert!(
            self.preferences.windows(2).all(|w| w[0].rank <= w[1].rank),
            "{}: ballot is not sorted by rank: {:?}",
            rule,
            self.preferences
        );
    }
}

impl Display for RankedBallot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marks: Vec<String> = self.preferences.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", marks.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn ballot(s: &str) -> RankedBallot {
        RankedBallot::parse(s).unwrap()
    }

    fn names(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_preference() {
        assert_eq!(
            Preference::parse("Alice(1)").unwrap(),
            Preference::new(1, "Alice")
        );
        assert_eq!(
            Preference::parse("  Henry (  10  ) ").unwrap(),
            Preference::new(10, "Henry")
        );
        assert_eq!(
            Preference::parse("Candidate 1  (10) ").unwrap(),
            Preference::new(10, "Candidate 1")
        );
        assert_eq!(
            Preference::parse("Henry(8) (10)").unwrap(),
            Preference::new(10, "Henry(8)")
        );
    }

    #[test]
    fn parse_preference_failures() {
        for token in [
            "Alice()",
            "Alice((42))",
            "Alice(0)",
            "(0)",
            "Alice(-10)",
            "Alice(2.5)",
            "Alice(pref)",
            "Alice",
            "Alice(1",
            "Alice(1)x",
            "    (23)",
            "",
            "Alice(99999999999)",
        ] {
            assert_eq!(
                Preference::parse(token),
                Err(AuditErrors::ParseFailure {
                    token: token.to_string()
                }),
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn parse_error_message() {
        let e = RankedBallot::parse("Alice(1),Bob").unwrap_err();
        assert_eq!(e.to_string(), "Couldn't parse candidate-preference: Bob");
    }

    #[test]
    fn parse_sorts_stably() {
        let b = ballot("Chuan(3),Alice(1),Bob(1),Diego(2)");
        assert_eq!(b.to_string(), "Alice(1),Bob(1),Diego(2),Chuan(3)");
        let b = RankedBallot::parse_tokens(&["Bob(2)", "Alice(1)"]).unwrap();
        assert_eq!(b.to_string(), "Alice(1),Bob(2)");
    }

    #[test]
    fn parse_blank() {
        assert!(ballot("").is_empty());
        assert!(ballot("   ").is_empty());
        assert!(RankedBallot::parse("Alice(1),,Bob(2)").is_err());
    }

    #[test]
    fn parse_trailing_commas() {
        assert_eq!(ballot("Alice(1),Bob(2),").to_string(), "Alice(1),Bob(2)");
        assert_eq!(ballot("Alice(1),,").to_string(), "Alice(1)");
        assert!(ballot(",,").is_empty());
        // Only empty tokens are dropped.
        assert!(RankedBallot::parse("Alice(1), ").is_err());
    }

    #[test]
    fn validity() {
        assert!(ballot("").is_valid());
        assert!(ballot("Alice(1)").is_valid());
        assert!(ballot("Alice(1),Chuan(3),Bob(2)").is_valid());
        assert!(!ballot("Alice(2),Bob(3)").is_valid());
        assert!(!ballot("Alice(1),Bob(3)").is_valid());
        assert!(!ballot("Alice(1),Bob(1)").is_valid());
        assert!(!ballot("Alice(1),Alice(2)").is_valid());
    }

    #[test]
    fn sorted_list() {
        assert_eq!(
            ballot("Bob(2),Alice(1)").as_sorted_list(),
            Ok(names(&["Alice", "Bob"]))
        );
        assert_eq!(
            ballot("Alice(1),Bob(1)").as_sorted_list(),
            Err(AuditErrors::InvalidBallot {
                ballot: "Alice(1),Bob(1)".to_string()
            })
        );
    }

    #[test]
    fn duplicates() {
        assert_eq!(ballot("Alice(1),Bob(2)").remove_duplicates().len(), 2);
        assert_eq!(ballot("Alice(1),Alice(1)").remove_duplicates().len(), 1);
        assert_eq!(ballot("Alice(2),Alice(1)").remove_duplicates().len(), 1);
        assert_eq!(ballot("Alice(1),Bob(3)").remove_duplicates().len(), 2);
        assert_eq!(
            ballot("Alice(1),Alice(2),Bob(2),Chuan(4),Bob(3)")
                .remove_duplicates()
                .to_string(),
            "Alice(1),Bob(2),Chuan(4)"
        );
        assert_eq!(
            ballot("Alice(1),Alice(2),Alice(4)")
                .remove_duplicates()
                .len(),
            1
        );
    }

    #[test]
    fn overvotes() {
        assert_eq!(ballot("Alice(1),Bob(1)").remove_overvotes().len(), 0);
        assert_eq!(
            ballot("Alice(1),Bob(2),Chuan(2),Diego(3)")
                .remove_overvotes()
                .to_string(),
            "Alice(1)"
        );
        assert_eq!(
            ballot("Alice(1),Bob(2),Chuan(3),Diego(3),Eve(3)")
                .remove_overvotes()
                .len(),
            2
        );
        assert_eq!(ballot("Alice(1),Bob(3)").remove_overvotes().len(), 2);
    }

    #[test]
    fn skips() {
        assert_eq!(ballot("Alice(2),Alice(1)").remove_skips().len(), 2);
        assert_eq!(ballot("Alice(1),Bob(2),Chuan(3)").remove_skips().len(), 3);
        assert_eq!(ballot("Alice(1),Bob(3)").remove_skips().len(), 1);
        assert_eq!(ballot("Bob(2),Chuan(3)").remove_skips().len(), 0);
        assert_eq!(ballot("Alice(1),Bob(2),Chuan(4)").remove_skips().len(), 2);
        assert_eq!(ballot("Alice(3),Bob(2),Chuan(4)").remove_skips().len(), 0);
        assert_eq!(ballot("").remove_skips().len(), 0);
    }

    #[test]
    fn rules_in_either_order() {
        let b = ballot("Alice(1),Bob(2),Chuan(2),Diego(4)");
        assert_eq!(b.remove_overvotes().remove_skips().len(), 1);
        assert_eq!(b.remove_skips().remove_overvotes().len(), 1);
    }

    #[test]
    fn valid_intent_scenarios() {
        init();
        let cases: Vec<(&str, Vec<&str>)> = vec![
            ("Alice(1),Bob(1),Chuan(1),Chuan(2),Bob(3)", vec![]),
            ("Bob(1),Alice(2),Chuan(2),Chuan(3)", vec!["Bob"]),
            ("Alice(1),Bob(3)", vec!["Alice"]),
            ("Alice(1),Alice(2),Bob(3)", vec!["Alice"]),
            ("Bob(1),Alice(2),Bob(2),Chuan(3)", vec!["Bob", "Alice", "Chuan"]),
            ("Alice(1),Alice(2),Bob(2),Chuan(4),Bob(3)", vec!["Alice", "Bob"]),
            ("Alice(1),Alice(2),Bob(2)", vec!["Alice", "Bob"]),
            ("Alice(1),Bob(2),Chuan(3)", vec!["Alice", "Bob", "Chuan"]),
            ("Bob(2),Chuan(3)", vec![]),
            ("", vec![]),
        ];
        for (raw, expected) in cases {
            assert_eq!(ballot(raw).valid_intent(), names(&expected), "{}", raw);
        }
    }

    #[test]
    fn valid_intent_is_idempotent() {
        for raw in [
            "Alice(1),Bob(1),Chuan(1),Chuan(2),Bob(3)",
            "Bob(1),Alice(2),Bob(2),Chuan(3)",
            "Alice(1),Alice(2),Bob(2),Chuan(4),Bob(3)",
            "Chuan(1),Bob(2),Alice(3),Diego(5)",
        ] {
            let intent = ballot(raw).valid_intent();
            let again = RankedBallot::from_ordered_candidates(&intent);
            assert!(again.is_valid());
            assert_eq!(again.valid_intent(), intent);
        }
    }

    #[test]
    fn valid_ballot_unchanged() {
        let b = ballot("Alice(1),Chuan(3),Bob(2)");
        assert_eq!(b.valid_intent(), b.as_sorted_list().unwrap());
    }
}

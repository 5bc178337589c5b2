pub use crate::assertion::*;
pub use crate::config::*;
pub use crate::contest_audit::ContestAudit;

use log::warn;

/// A builder for the audit of a contest, from the assertions produced by
/// an assertion generator.
///
/// ```
/// pub use irv_audit::builder::Builder;
/// pub use irv_audit::AuditParameters;
/// # use irv_audit::AuditErrors;
///
/// let mut builder = Builder::new(&AuditParameters::DEFAULT_PARAMETERS, "Mayor", 1000)?
///     .candidates(&["Anna".to_string(), "Bob".to_string(), "Clara".to_string()])?;
///
/// builder.add_neb("Anna", "Bob", 120, 8.3)?;
/// builder.add_nen("Anna", "Clara", 40, 25.0, &["Anna".to_string(), "Clara".to_string()])?;
///
/// let audit = builder.build();
/// assert_eq!(audit.assertions().len(), 2);
/// assert_eq!(audit.min_margin(), 40);
/// # Ok::<(), AuditErrors>(())
/// ```
pub struct Builder {
    pub(crate) _parameters: AuditParameters,
    pub(crate) _contest_name: String,
    pub(crate) _universe_size: u64,
    pub(crate) _candidates: Option<Vec<String>>,
    pub(crate) _assertions: Vec<Assertion>,
}

impl Builder {
    pub fn new(
        parameters: &AuditParameters,
        contest_name: &str,
        universe_size: u64,
    ) -> Result<Builder, AuditErrors> {
        if universe_size == 0 {
            return Err(AuditErrors::ZeroUniverseSize {
                contest: contest_name.to_string(),
            });
        }
        Ok(Builder {
            _parameters: *parameters,
            _contest_name: contest_name.to_string(),
            _universe_size: universe_size,
            _candidates: None,
            _assertions: Vec::new(),
        })
    }

    /// The candidates of the contest. Assertions naming other candidates are
    /// still accepted, with a warning.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, AuditErrors> {
        Ok(Builder {
            _candidates: Some(cands.to_vec()),
            ..self
        })
    }

    pub fn add_neb(
        &mut self,
        winner: &str,
        loser: &str,
        margin: u64,
        difficulty: f64,
    ) -> Result<(), AuditErrors> {
        let a = Assertion::new_neb(
            &self._contest_name,
            winner,
            loser,
            margin,
            self._universe_size,
            difficulty,
        )?;
        self.add_assertion(a)
    }

    /// Adds a "not eliminated next" assertion.
    ///
    /// assumed_continuing: the candidates that are not eliminated yet when the
    /// winner and the loser are compared.
    pub fn add_nen(
        &mut self,
        winner: &str,
        loser: &str,
        margin: u64,
        difficulty: f64,
        assumed_continuing: &[String],
    ) -> Result<(), AuditErrors> {
        let a = Assertion::new_nen(
            &self._contest_name,
            winner,
            loser,
            margin,
            self._universe_size,
            difficulty,
            assumed_continuing,
        )?;
        self.add_assertion(a)
    }

    fn add_assertion(&mut self, a: Assertion) -> Result<(), AuditErrors> {
        if let Some(cands) = self._candidates.as_deref() {
            let mut named = vec![&a.winner, &a.loser];
            if let AssertionRule::NotEliminatedNext { assumed_continuing } = &a.rule {
                named.extend(assumed_continuing.iter());
            }
            for name in named {
                if !cands.contains(name) {
                    warn!(
                        "add_assertion: contest {}: {} is not a declared candidate",
                        self._contest_name, name
                    );
                }
            }
        }
        self._assertions.push(a);
        Ok(())
    }

    pub fn build(self) -> ContestAudit {
        ContestAudit::new(
            &self._contest_name,
            self._universe_size,
            &self._parameters,
            self._assertions,
        )
    }
}

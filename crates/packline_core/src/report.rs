use crate::JobOutcome;

/// Aggregate view of a run, folded from its outcomes after the fact.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
  pub succeeded: usize,
  pub failed: usize,
  /// Size of every produced artifact's code, maps excluded.
  pub total_bytes: usize,
  pub replacements: usize,
}

impl Summary {
  pub fn from_outcomes(outcomes: &[JobOutcome]) -> Self {
    outcomes
      .iter()
      .fold(Self::default(), |mut summary, outcome| {
        match &outcome.result {
          Ok(artifact) => {
            summary.succeeded += 1;
            summary.total_bytes += artifact.code.len();
            summary.replacements += artifact.replacements;
          }
          Err(_) => summary.failed += 1,
        }
        summary
      })
  }

  pub fn is_success(&self) -> bool {
    self.failed == 0
  }
}

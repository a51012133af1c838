use crate::Error;

/// A collection of packline [Error].
///
/// [Errors] is never empty. You could only construct a `Errors` from a `Error`.
#[derive(Debug)]
pub struct Errors(Vec<Error>);

impl Errors {
  pub fn iter(&self) -> impl Iterator<Item = &Error> {
    self.0.iter()
  }

  pub fn into_vec(self) -> Vec<Error> {
    self.0
  }

  /// Returns `None` for an empty `Vec`, so the non-empty promise holds.
  pub fn from_vec(vec: Vec<Error>) -> Option<Self> {
    if vec.is_empty() {
      None
    } else {
      Some(Self(vec))
    }
  }
}

impl From<Error> for Errors {
  fn from(error: Error) -> Self {
    Self(vec![error])
  }
}

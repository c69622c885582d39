//! Canonical form of user search input.
//!
//! The normalized string doubles as the cache key and the remote `q`
//! parameter, so terms are joined with `+`.

use crate::error::QueryError;

/// Delimiter placed between search terms.
pub const TERM_DELIMITER: char = '+';

/// Trim, collapse whitespace runs and join the remaining terms with `+`.
///
/// `normalize(normalize(x)) == normalize(x)` for every accepted input.
pub fn normalize(raw: &str) -> Result<String, QueryError> {
  let joined = raw
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(&TERM_DELIMITER.to_string());

  if joined.is_empty() {
    return Err(QueryError::Empty);
  }
  Ok(joined)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[rstest]
  #[case("  Jazz   History ", "Jazz+History")]
  #[case("android", "android")]
  #[case("rust\tprogramming\nlanguage", "rust+programming+language")]
  #[case("Jazz+History", "Jazz+History")]
  #[case(" c++  primer", "c+++primer")]
  fn test_normalize(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(normalize(raw).unwrap(), expected);
  }

  #[rstest]
  #[case("")]
  #[case("   ")]
  #[case("\t\n ")]
  fn test_blank_input_is_rejected(#[case] raw: &str) {
    assert_eq!(normalize(raw), Err(QueryError::Empty));
  }

  #[rstest]
  #[case("  Jazz   History ")]
  #[case("a b c")]
  #[case("already+normalized")]
  #[case("  spaced   out\tterms  ")]
  fn test_normalize_is_idempotent(#[case] raw: &str) {
    let once = normalize(raw).unwrap();
    assert_eq!(normalize(&once).unwrap(), once);
  }
}

//! Resolving a free-text centre name to exactly one directory entry.

use crate::model::{Centre, Session};
use crate::ports::{BookingError, BookingPort};

/// Case-insensitive subsequence match: every character of `needle` must
/// appear in `haystack` in order, not necessarily contiguously.
#[must_use]
pub fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let mut haystack_chars = haystack.chars();

    needle
        .to_lowercase()
        .chars()
        .all(|wanted| haystack_chars.any(|candidate| candidate == wanted))
}

/// Pick the single centre whose rendered label fuzzy-matches `search`.
///
/// # Errors
///
/// Returns [`BookingError::NoCentreMatch`] when nothing matches and
/// [`BookingError::AmbiguousCentre`] (listing every matched label) when
/// the search is not specific enough.
pub fn match_centre<'centres>(
    centres: &'centres [Centre],
    search: &str,
) -> Result<&'centres Centre, BookingError> {
    let matches: Vec<&Centre> = centres
        .iter()
        .filter(|centre| is_subsequence(search, &centre.to_string()))
        .collect();

    match matches.as_slice() {
        [only] => Ok(only),
        [] => Err(BookingError::NoCentreMatch {
            search: search.to_owned(),
        }),
        _ => Err(BookingError::AmbiguousCentre {
            search: search.to_owned(),
            matches: matches.iter().map(ToString::to_string).collect(),
        }),
    }
}

/// Fetch the centre directory and resolve `search` against it. Runs once
/// at startup, never during polling.
///
/// # Errors
///
/// Propagates directory-fetch failures and the match errors of
/// [`match_centre`].
pub async fn resolve_centre(
    port: &dyn BookingPort,
    session: &Session,
    search: &str,
) -> Result<Centre, BookingError> {
    let centres = port.centres(session).await?;

    Ok(match_centre(&centres, search)?.clone())
}

#[cfg(test)]
mod tests {
    use crate::model::CentreId;

    use super::*;

    fn centre(id: i64, location: &str, county: &str) -> Centre {
        Centre {
            id: CentreId(id),
            location: location.to_owned(),
            county: county.to_owned(),
        }
    }

    #[test]
    fn subsequence_ignores_case_and_gaps() {
        assert!(is_subsequence("bally", "Ballyfermot, Dublin"));
        assert!(is_subsequence("blfmt", "Ballyfermot, Dublin"));
        assert!(is_subsequence("", "anything"));
        assert!(!is_subsequence("xyz123", "Ballyfermot, Dublin"));
        // in-order only: the characters exist but not in this order
        assert!(!is_subsequence("dublin bally", "Ballyfermot, Dublin"));
    }

    #[test]
    fn exactly_one_match_resolves() {
        let centres = [
            centre(1, "Ballyfermot", "Dublin"),
            centre(2, "Ennis", "Clare"),
        ];

        let matched = match_centre(&centres, "bally").unwrap();

        assert_eq!(matched.id, CentreId(1));
    }

    #[test]
    fn zero_matches_names_the_search() {
        let centres = [centre(1, "Ballyfermot", "Dublin")];

        let err = match_centre(&centres, "xyz123").unwrap_err();

        match err {
            BookingError::NoCentreMatch { search } => assert_eq!(search, "xyz123"),
            other => panic!("expected NoCentreMatch, got {other}"),
        }
    }

    #[test]
    fn ambiguity_lists_every_candidate() {
        let centres = [
            centre(1, "Ballyfermot", "Dublin"),
            centre(2, "Ballina", "Mayo"),
        ];

        let err = match_centre(&centres, "ball").unwrap_err();

        match err {
            BookingError::AmbiguousCentre { search, matches } => {
                assert_eq!(search, "ball");
                assert_eq!(
                    matches,
                    vec![
                        "Ballyfermot, Dublin".to_owned(),
                        "Ballina, Mayo".to_owned()
                    ]
                );
            }
            other => panic!("expected AmbiguousCentre, got {other}"),
        }
    }
}

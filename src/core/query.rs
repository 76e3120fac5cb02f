use crate::error::{Error, Result};
use crate::models::TrackId;

const ID_MARKER: &str = "id=";

/// Extract a track ID from free-form input.
///
/// Accepted forms:
/// - "12345"
/// - "https://music.163.com/song?id=12345&userid=1"
/// - "...#/song?id=12345"
///
/// The first `id=` followed by at least one digit wins; without one the
/// whole input must be digits.
pub fn normalize(query: &str) -> Result<TrackId> {
    let candidate = find_id_fragment(query).unwrap_or(query);

    if candidate.is_empty() || !candidate.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidQuery(query.to_string()));
    }

    Ok(TrackId::from_digits(candidate))
}

fn find_id_fragment(query: &str) -> Option<&str> {
    query.match_indices(ID_MARKER).find_map(|(pos, _)| {
        let rest = &query[pos + ID_MARKER.len()..];
        let len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
        (len > 0).then(|| &rest[..len])
    })
}

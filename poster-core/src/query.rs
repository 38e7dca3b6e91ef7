//! `?seed=` query parameter handling.
//!
//! Editors read the seed from the page URL at load time and rewrite it after
//! every regenerate, so a shared link reproduces the same poster.

use url::Url;

use crate::error::CoreResult;
use crate::params::EditorKind;
use crate::seed::Seed;

/// Name of the seed query parameter.
pub const SEED_PARAM: &str = "seed";

/// Read the seed from `url`, if the query carries one.
///
/// The value goes through [`Seed::parse`], so the displayed text and the
/// numeric seed always agree.
#[must_use]
pub fn seed_from_url(url: &Url) -> Option<Seed> {
    url.query_pairs()
        .find(|(key, _)| key == SEED_PARAM)
        .map(|(_, value)| Seed::parse(&value))
}

/// Read the seed from `url` the way `kind`'s editor parses its seed field.
#[must_use]
pub fn editor_seed_from_url(url: &Url, kind: EditorKind) -> Option<Seed> {
    url.query_pairs()
        .find(|(key, _)| key == SEED_PARAM)
        .map(|(_, value)| kind.parse_seed(&value))
}

/// Parse `input` as a URL and read its seed.
///
/// # Errors
///
/// Returns [`crate::CoreError::InvalidUrl`] if `input` is not a valid URL.
pub fn seed_from_str(input: &str) -> CoreResult<Option<Seed>> {
    let url = Url::parse(input)?;
    Ok(seed_from_url(&url))
}

/// Copy of `url` with the seed parameter set to the seed's label, preserving
/// every other query pair.
#[must_use]
pub fn url_with_seed(url: &Url, seed: &Seed) -> Url {
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != SEED_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut updated = url.clone();
    {
        let mut pairs = updated.query_pairs_mut();
        pairs.clear();
        for (key, value) in &others {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(SEED_PARAM, &seed.label());
    }
    updated
}

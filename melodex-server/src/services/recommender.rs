//! Prompt construction for AI recommendations
//!
//! The user's free-text intent is wrapped in a secondary prompt asking the
//! model for a single catalog search query. The model's answer is cleaned up
//! into something the catalog search accepts.

/// Number of results stored with a recommendation record
pub const RECORDED_RESULT_LIMIT: usize = 5;

/// Longest query forwarded to the catalog
const MAX_QUERY_CHARS: usize = 100;

/// Wrap the user's intent in a prompt that asks for a concise search query
pub fn build_query_prompt(intent: &str) -> String {
    format!(
        "You are a music discovery assistant. Turn the listener's request below into \
         one concise Spotify search query made of artist names, song titles, genres or \
         mood keywords. Reply with the query only, without quotes or explanation.\n\n\
         Request: {}",
        intent.trim()
    )
}

/// Extract a usable search query from the model's answer
///
/// Takes the first non-empty line, drops a leading `Query:` label and
/// surrounding quotes, and caps the length. Returns `None` when nothing
/// usable remains.
pub fn normalize_query(generated: &str) -> Option<String> {
    let line = generated.lines().map(str::trim).find(|l| !l.is_empty())?;

    let line = strip_prefix_ignore_case(line, "search query:")
        .or_else(|| strip_prefix_ignore_case(line, "query:"))
        .unwrap_or(line)
        .trim();

    let query = line
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '“' | '”'))
        .trim();

    if query.is_empty() {
        return None;
    }

    Some(query.chars().take(MAX_QUERY_CHARS).collect())
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

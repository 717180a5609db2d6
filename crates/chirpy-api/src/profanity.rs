/// Longest chirp body accepted, in characters.
pub const MAX_CHIRP_LENGTH: usize = 140;

const PROFANE_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];
const REPLACEMENT: &str = "****";

/// Replace banned words with asterisks. Words are split on single spaces and
/// matched case-insensitively; punctuation attached to a word defeats the match.
pub fn clean(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.contains(&word.to_lowercase().as_str()) {
                REPLACEMENT
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_too_long(body: &str) -> bool {
    body.chars().count() > MAX_CHIRP_LENGTH
}

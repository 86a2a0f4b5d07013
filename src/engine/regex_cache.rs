//! Thread-local regex cache for pattern compilation
//!
//! `re` rules match at the cursor only, so every pattern is compiled as a
//! byte regex anchored with `\A`. Compiled patterns are cached per thread.

use hashbrown::HashMap;
use regex::bytes::Regex;
use std::cell::RefCell;

thread_local! {
    /// Thread-local cache of compiled, anchored regex patterns
    static REGEX_CACHE: RefCell<HashMap<String, Regex>> = RefCell::new(HashMap::new());
}

/// Get or compile an anchored regex for `pattern`
#[inline]
pub fn get_or_compile(pattern: &str) -> Result<Regex, regex::Error> {
    REGEX_CACHE.with(|cache| {
        if let Some(regex) = cache.borrow().get(pattern) {
            return Ok(regex.clone());
        }

        let regex = Regex::new(&format!(r"\A(?:{})", pattern))?;
        cache
            .borrow_mut()
            .insert(pattern.to_string(), regex.clone());
        Ok(regex)
    })
}

/// Length of the match of `pattern` at the start of `bytes`
pub fn match_len(pattern: &str, bytes: &[u8]) -> Result<Option<usize>, regex::Error> {
    Ok(get_or_compile(pattern)?.find(bytes).map(|m| m.end()))
}

/// Whether `pattern` can match the empty string
pub fn matches_empty(pattern: &str) -> Result<bool, regex::Error> {
    Ok(get_or_compile(pattern)?.is_match(b""))
}

/// Clear the regex cache
pub fn clear_cache() {
    REGEX_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Get the number of cached patterns
pub fn cache_size() -> usize {
    REGEX_CACHE.with(|cache| cache.borrow().len())
}

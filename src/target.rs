// Target normalization: raw user input -> bare channel handle.
//
// Accepts `@handle`, `handle`, `t.me/handle`, full `https://t.me/handle/123`
// style URLs (also telegram.me and telegram.dog). Invite links are detected
// separately and must be rejected by the caller before any fetch.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::IntelError;

/// Shortest handle the upstream accepts.
pub const MIN_HANDLE_LEN: usize = 4;

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]{3,}$").expect("handle regex"));

static CHANNEL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?(?:t\.me|telegram\.me|telegram\.dog)/(?:s/)?([A-Za-z][A-Za-z0-9_]{3,})",
    )
    .expect("channel link regex")
});

static PRIVATE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:t\.me|telegram\.me|telegram\.dog)/(?:\+|joinchat/)|tg://join\?invite=")
        .expect("private link regex")
});

/// Service paths on the link host that look like handles but aren't channels.
const RESERVED_PATHS: &[&str] = &[
    "joinchat",
    "addstickers",
    "addemoji",
    "addlist",
    "share",
    "proxy",
    "socks",
    "setlanguage",
    "login",
    "boost",
    "contact",
    "iv",
];

fn is_reserved(path: &str) -> bool {
    RESERVED_PATHS.iter().any(|r| r.eq_ignore_ascii_case(path))
}

/// Normalize a raw target into a bare handle.
///
/// Never fails: if nothing recognizable is found, the trimmed input (minus
/// leading `@`) comes back unchanged and the caller decides whether it's
/// usable. Idempotent.
pub fn normalize_target(raw: &str) -> String {
    let trimmed = raw
        .trim_start_matches(|c: char| c == '@' || c.is_whitespace())
        .trim_end();

    let linked = CHANNEL_LINK_RE
        .captures_iter(trimmed)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|handle| !is_reserved(handle));
    if let Some(handle) = linked {
        return handle.to_string();
    }

    trimmed.to_string()
}

/// True if the target is an invite-style link to a private channel or group.
pub fn is_private_target(raw: &str) -> bool {
    PRIVATE_LINK_RE.is_match(raw)
}

/// True if the string is a syntactically valid handle.
pub fn is_valid_handle(candidate: &str) -> bool {
    HANDLE_RE.is_match(candidate)
}

/// Unique lowercase channel handles linked from free text.
///
/// Invite links and service paths are skipped. Returned sorted so callers
/// get deterministic output.
pub fn extract_linked_handles(text: &str) -> BTreeSet<String> {
    if text.is_empty() {
        return BTreeSet::new();
    }
    CHANNEL_LINK_RE
        .captures_iter(text)
        .filter(|caps| {
            caps.get(0)
                .is_some_and(|whole| !is_private_target(whole.as_str()))
        })
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|handle| !is_reserved(handle))
        .map(str::to_lowercase)
        .collect()
}

/// A validated channel handle.
///
/// Case is preserved for display; comparisons should go through `key()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHandle(String);

impl TargetHandle {
    /// Normalize and validate a raw target.
    ///
    /// Callers must check `is_private_target` first; an invite link that
    /// reaches this point is reported as an invalid target.
    pub fn parse(raw: &str) -> Result<Self, IntelError> {
        let handle = normalize_target(raw);
        if handle.chars().count() < MIN_HANDLE_LEN || !is_valid_handle(&handle) {
            return Err(IntelError::InvalidTarget(raw.to_string()));
        }
        Ok(Self(handle))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used for identity comparisons.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

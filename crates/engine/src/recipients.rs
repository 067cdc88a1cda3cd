//! Mention extraction and GitHub → Slack username mapping.
//!
//! The mapping is built from `SLACK_USERNAME_FOR_<HANDLE>=<slack name>`
//! environment entries. Both sides are lowercased and `@`-prefixed when the
//! map is built, so lookups compare exact strings.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::sync::{Arc, LazyLock, OnceLock};

use regex::Regex;

const MENTION_SIGIL: char = '@';

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[A-Za-z0-9_]+").expect("Invalid mention regex"));

static MAPPING_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SLACK_USERNAME_FOR_([A-Za-z0-9_]+)$").expect("Invalid mapping key regex")
});

static SHARED: OnceLock<Arc<UsernameMap>> = OnceLock::new();

/// Every `@handle` token in `text`, in order of appearance, case preserved.
pub fn extract_mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Prefix a bare login with the mention sigil.
pub fn mention(login: &str) -> String {
    format!("{}{}", MENTION_SIGIL, login)
}

/// Immutable GitHub → Slack handle lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsernameMap {
    entries: HashMap<String, String>,
}

impl UsernameMap {
    /// Build from `(key, value)` pairs, keeping only `SLACK_USERNAME_FOR_*` keys.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entries = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let handle = MAPPING_KEY_RE.captures(key.as_ref())?.get(1)?.as_str();
                Some((
                    mention(&handle.to_lowercase()),
                    normalize_target(value.as_ref()),
                ))
            })
            .collect();
        Self { entries }
    }

    /// The process-wide map, built from the environment on first access.
    pub fn shared() -> Arc<UsernameMap> {
        SHARED
            .get_or_init(|| {
                let map = UsernameMap::from_vars(utf8_vars(std::env::vars_os()));
                tracing::info!(entries = map.len(), "Username mapping loaded");
                Arc::new(map)
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, handle: &str) -> Option<&str> {
        self.entries.get(handle).map(String::as_str)
    }

    /// Map each handle (unmapped handles pass through unchanged) and drop
    /// duplicates, keeping the first occurrence.
    pub fn resolve<S: AsRef<str>>(&self, handles: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        handles
            .iter()
            .map(|h| {
                let h = h.as_ref();
                self.lookup(h).unwrap_or(h).to_string()
            })
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }
}

/// Keep only entries whose key and value are both valid UTF-8. Unrelated
/// variables with arbitrary bytes must not abort startup.
fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn normalize_target(value: &str) -> String {
    let value = value.trim().to_lowercase();
    if value.starts_with(MENTION_SIGIL) {
        value
    } else {
        mention(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mentions_preserves_order_and_case() {
        assert_eq!(
            extract_mentions("ping @Carol and @dave_2, cc @Carol."),
            vec!["@Carol", "@dave_2", "@Carol"]
        );
    }

    #[test]
    fn test_extract_mentions_ignores_bare_sigil() {
        assert!(extract_mentions("email me @ home").is_empty());
        assert_eq!(extract_mentions("a@b"), vec!["@b"]);
    }

    #[test]
    fn test_from_vars_normalizes_case() {
        let map = UsernameMap::from_vars([
            ("SLACK_USERNAME_FOR_ALICE", "A.Smith"),
            ("SLACK_USERNAME_FOR_bob", "@Bobby"),
            ("SLACK_CHANNEL", "#dev"),
            ("XSLACK_USERNAME_FOR_EVE", "mallory"),
        ]);

        assert_eq!(map.len(), 2);
        assert_eq!(map.lookup("@alice"), Some("@a.smith"));
        assert_eq!(map.lookup("@bob"), Some("@bobby"));
        assert_eq!(map.lookup("@eve"), None);
    }

    #[test]
    fn test_resolve_maps_and_passes_through() {
        let map = UsernameMap::from_vars([("SLACK_USERNAME_FOR_ALICE", "a.smith")]);
        assert_eq!(
            map.resolve(&["@alice", "@dave"]),
            vec!["@a.smith".to_string(), "@dave".to_string()]
        );
    }

    #[test]
    fn test_resolve_dedups_after_mapping() {
        // Two GitHub accounts owned by the same Slack user collapse to one mention.
        let map = UsernameMap::from_vars([
            ("SLACK_USERNAME_FOR_ALICE", "a.smith"),
            ("SLACK_USERNAME_FOR_ALICE_WORK", "a.smith"),
        ]);
        assert_eq!(
            map.resolve(&["@dave", "@alice", "@alice_work", "@dave"]),
            vec!["@dave".to_string(), "@a.smith".to_string()]
        );
    }

    #[test]
    fn test_lookup_is_exact_after_normalization() {
        // Keys are lowercased at build time; mixed-case mentions pass through.
        let map = UsernameMap::from_vars([("SLACK_USERNAME_FOR_ALICE", "a.smith")]);
        assert_eq!(map.resolve(&["@Alice"]), vec!["@Alice".to_string()]);
    }

    #[test]
    fn test_resolve_empty() {
        let empty: [&str; 0] = [];
        assert!(UsernameMap::default().resolve(&empty).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_entries_are_skipped() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("SOME_OTHER_VAR"), OsString::from_vec(b"caf\xe9".to_vec())),
            (
                OsString::from_vec(b"SLACK_USERNAME_FOR_\xff".to_vec()),
                OsString::from("ghost"),
            ),
            (
                OsString::from("SLACK_USERNAME_FOR_BOB"),
                OsString::from_vec(b"rob\xe9rt".to_vec()),
            ),
            (OsString::from("SLACK_USERNAME_FOR_ALICE"), OsString::from("a.smith")),
        ];

        let map = UsernameMap::from_vars(utf8_vars(vars));
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup("@alice"), Some("@a.smith"));
        assert_eq!(map.lookup("@bob"), None);
    }

    #[test]
    fn test_shared_is_initialized_once() {
        let first = UsernameMap::shared();
        let second = UsernameMap::shared();
        assert!(Arc::ptr_eq(&first, &second));
    }
}

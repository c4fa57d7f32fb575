use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

/// Tracking parameters removed when no rules file is available.
pub const DEFAULT_BLOCKLIST: [&str; 20] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "si",
    "ref",
    "gclid",
    "gclsrc",
    "dclid",
    "msclkid",
    "mc_eid",
    "_ga",
    "yclid",
    "vero_conv",
    "vero_id",
    "wickedid",
    "share_id",
    "igshid",
];

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("fail to access rules file: {0}")]
    Io(#[from] std::io::Error),
    #[error("fail to parse rules file: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("fail to serialize rules: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// On-disk and over-the-wire representation of the blocklist.
#[derive(Serialize, Deserialize, Debug, Default)]
pub(crate) struct RuleConfig {
    #[serde(default)]
    pub(crate) blocklist: Vec<String>,
}

/// A set of query parameter names to strip. Names are matched case
/// sensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blocklist {
    params: HashSet<String>,
}

impl Blocklist {
    pub fn new<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Blocklist {
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, param: &str) -> bool {
        self.params.contains(param)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parse the JSON `{"blocklist": [...]}` form.
    pub fn parse(content: &str) -> Result<Self, RulesError> {
        let config: RuleConfig = serde_json::from_str(content).map_err(RulesError::Parse)?;
        Ok(Blocklist::new(config.blocklist))
    }

    pub fn parse_from_file<P: AsRef<Path> + Debug>(path: P) -> Result<Self, RulesError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Write the list as pretty JSON. Entries are sorted so the file diffs
    /// cleanly between updates.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RulesError> {
        let mut blocklist: Vec<String> = self.params.iter().cloned().collect();
        blocklist.sort();
        let content = serde_json::to_string_pretty(&RuleConfig { blocklist })
            .map_err(RulesError::Serialize)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Shared holder of the active blocklist.
///
/// Readers take a [`snapshot`](BlocklistStore::snapshot), which is an `Arc`
/// to an immutable list. A concurrent [`replace`](BlocklistStore::replace)
/// swaps the pointer and never touches a list that is already handed out.
#[derive(Debug)]
pub struct BlocklistStore {
    current: RwLock<Arc<Blocklist>>,
}

impl BlocklistStore {
    pub fn new(blocklist: Blocklist) -> Self {
        BlocklistStore {
            current: RwLock::new(Arc::new(blocklist)),
        }
    }

    pub fn snapshot(&self) -> Arc<Blocklist> {
        Arc::clone(&*self.current.read())
    }

    pub fn replace(&self, blocklist: Blocklist) {
        *self.current.write() = Arc::new(blocklist);
    }

    /// Load the rules file at `path`, creating it with the default list
    /// first if it does not exist.
    ///
    /// # Error
    ///
    /// When the file cannot be created, read or parsed the default list is
    /// installed and the error is returned so the caller can report it.
    pub fn load_or_init<P: AsRef<Path> + Debug>(&self, path: P) -> Result<(), RulesError> {
        let defaults = Blocklist::new(DEFAULT_BLOCKLIST);
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("rules file {path:?} not found, writing defaults");
            if let Err(error) = defaults.save(path) {
                self.replace(defaults);
                return Err(error);
            }
        }

        match Blocklist::parse_from_file(path) {
            Ok(blocklist) => {
                tracing::debug!("loaded {} rules from {path:?}", blocklist.len());
                self.replace(blocklist);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("fail to load rules from {path:?}: {error}");
                self.replace(defaults);
                Err(error)
            }
        }
    }
}

impl Default for BlocklistStore {
    fn default() -> Self {
        BlocklistStore::new(Blocklist::new(DEFAULT_BLOCKLIST))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_isolated_from_replace() {
        let store = BlocklistStore::new(Blocklist::new(["utm_source"]));
        let before = store.snapshot();

        store.replace(Blocklist::new(["fbclid", "gclid"]));

        assert!(before.contains("utm_source"));
        assert!(!before.contains("fbclid"));
        assert_eq!(store.snapshot().len(), 2);
        assert!(store.snapshot().contains("fbclid"));
    }

    #[test]
    fn test_blocklist_dedup_and_case() {
        let list = Blocklist::new(["ref", "ref", "Ref"]);
        assert_eq!(list.len(), 2);
        assert!(list.contains("ref"));
        assert!(!list.contains("REF"));
    }

    #[test]
    fn test_parse() {
        let list = Blocklist::parse(r#"{"blocklist": ["a", "b"]}"#).unwrap();
        assert_eq!(list, Blocklist::new(["a", "b"]));
        assert!(Blocklist::parse(r#"{"blocklist": "a"}"#).is_err());
        assert!(Blocklist::parse("{}").unwrap().is_empty());
    }

    #[test]
    fn test_load_or_init_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let store = BlocklistStore::new(Blocklist::default());

        store.load_or_init(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.snapshot().len(), DEFAULT_BLOCKLIST.len());
        let on_disk = Blocklist::parse_from_file(&path).unwrap();
        assert_eq!(on_disk, Blocklist::new(DEFAULT_BLOCKLIST));
    }

    #[test]
    fn test_load_or_init_reads_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"{"blocklist": ["only_this"]}"#).unwrap();
        let store = BlocklistStore::default();

        store.load_or_init(&path).unwrap();

        assert_eq!(*store.snapshot(), Blocklist::new(["only_this"]));
    }

    #[test]
    fn test_load_or_init_falls_back_on_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "not json").unwrap();
        let store = BlocklistStore::new(Blocklist::default());

        let result = store.load_or_init(&path);

        assert!(matches!(result, Err(RulesError::Parse(_))));
        assert_eq!(store.snapshot().len(), DEFAULT_BLOCKLIST.len());
    }
}

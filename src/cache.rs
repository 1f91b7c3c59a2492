use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use crate::parser::ParseResult;

/// Bumped whenever the extraction logic changes in a way that could change
/// a cached [`ParseResult`] for the same source bytes.
pub const PARSER_VERSION: u32 = 1;

pub const CACHE_DIR: &str = ".code-graph";

/// Identifies one cached parse artifact: the file it came from, a hash of
/// its exact byte contents, and the parser version that produced it (spec
/// §4.9). Any change to any of the three invalidates the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub file_path: String,
    pub content_hash: u64,
    pub parser_version: u32,
}

impl CacheKey {
    pub fn new(file_path: &str, content: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self {
            file_path: file_path.to_string(),
            content_hash: hasher.finish(),
            parser_version: PARSER_VERSION,
        }
    }

    fn cache_file_name(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.file_path.hash(&mut hasher);
        self.content_hash.hash(&mut hasher);
        self.parser_version.hash(&mut hasher);
        format!("{:016x}.bin", hasher.finish())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CacheEntry {
    file_path: String,
    content_hash: u64,
    parser_version: u32,
    language: String,
    result: ParseResult,
}

/// On-disk artifact cache: one bincode-encoded file per (file, content,
/// parser-version) triple, written atomically via a temp file + rename
/// (spec §4.9). A cache miss is never an error — callers fall through to
/// re-parsing.
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    pub fn new(project_root: &Path) -> Self {
        Self {
            dir: project_root.join(CACHE_DIR).join("artifacts"),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<(String, ParseResult)> {
        let path = self.dir.join(key.cache_file_name());
        let bytes = std::fs::read(&path).ok()?;
        let (entry, _): (CacheEntry, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).ok()?;
        if entry.file_path != key.file_path
            || entry.content_hash != key.content_hash
            || entry.parser_version != key.parser_version
        {
            return None;
        }
        Some((entry.language, entry.result))
    }

    pub fn put(&self, key: &CacheKey, language: &str, result: &ParseResult) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let entry = CacheEntry {
            file_path: key.file_path.clone(),
            content_hash: key.content_hash,
            parser_version: key.parser_version,
            language: language.to_string(),
            result: result.clone(),
        };

        let target = self.dir.join(key.cache_file_name());
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        bincode::serde::encode_into_std_write(&entry, &mut tmp, bincode::config::standard())?;
        use std::io::Write;
        tmp.as_file().flush()?;
        tmp.persist(&target)?;
        Ok(())
    }
}

/// A change notification emitted as the engine mutates the graph (spec §6
/// CDC stream). This crate's broadcaster is an in-process stand-in for the
/// external CDC stream described in the ambient interface surface.
#[derive(Debug, Clone)]
pub enum CdcEvent {
    NodeAdded { node_id: String },
    NodeRemoved { node_id: String },
    RelationshipAdded { relationship_id: String },
    RelationshipRemoved { relationship_id: String },
    AnalysisStarted { project_root: String },
    AnalysisFinished { project_root: String, node_count: usize, relationship_count: usize },
}

/// Fan-out broadcaster for [`CdcEvent`]s: every subscriber gets its own
/// `mpsc::Receiver` and sees every event published after it subscribed.
#[derive(Default)]
pub struct CdcBroadcaster {
    subscribers: Mutex<Vec<Sender<CdcEvent>>>,
}

impl CdcBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<CdcEvent> {
        let (tx, rx) = channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Publish to every live subscriber, dropping any whose receiver has
    /// gone away.
    pub fn publish(&self, event: CdcEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::NodeKind;
    use crate::parser::symbols::ExtractedDefinition;

    fn sample_result() -> ParseResult {
        ParseResult {
            definitions: vec![ExtractedDefinition {
                name: "foo".into(),
                kind: NodeKind::Function,
                location: crate::graph::node::Location::point("a.rs", 1),
                complexity: 1,
                enclosing: None,
            }],
            imports: Vec::new(),
            calls: Vec::new(),
            partial: false,
        }
    }

    #[test]
    fn roundtrips_artifact_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path());
        let key = CacheKey::new("a.rs", b"fn foo() {}");
        assert!(cache.get(&key).is_none());

        cache.put(&key, "rust", &sample_result()).unwrap();
        let (lang, result) = cache.get(&key).expect("cached entry should load");
        assert_eq!(lang, "rust");
        assert_eq!(result.definitions.len(), 1);
        assert_eq!(result.definitions[0].name, "foo");
    }

    #[test]
    fn different_content_hash_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new(dir.path());
        let key_a = CacheKey::new("a.rs", b"fn foo() {}");
        let key_b = CacheKey::new("a.rs", b"fn bar() {}");
        cache.put(&key_a, "rust", &sample_result()).unwrap();
        assert!(cache.get(&key_b).is_none());
    }

    #[test]
    fn broadcaster_delivers_to_existing_subscribers() {
        let broadcaster = CdcBroadcaster::new();
        let rx = broadcaster.subscribe();
        broadcaster.publish(CdcEvent::NodeAdded {
            node_id: "a.rs:foo:1".to_string(),
        });
        match rx.try_recv().unwrap() {
            CdcEvent::NodeAdded { node_id } => assert_eq!(node_id, "a.rs:foo:1"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

//! Storage tree and descriptor generators

use dissemination::{ArticleStore, Config, LocalObjectStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Descriptor of a two version article whose second version was withdrawn
pub const WITHDRAWN_ABS: &str = "\\\\
arXiv:0704.0002
From: Withdrawing Author <w@example.org>
Date: Mon, 2 Apr 2007 19:18:42 GMT   (21kb)
Date (revised v2): Tue, 24 Jul 2007 20:10:27 GMT   (1kb,I)
\\\\
Title: A paper that was withdrawn
\\\\
  This paper has been withdrawn by the author.
\\\\
";

/// Descriptor text with one `Date` line per source type
pub fn descriptor(id: &str, source_types: &[&str]) -> String {
    let mut text = format!("\\\\\narXiv:{id}\nFrom: Test Author <t@example.org>\n");
    for (i, source_type) in source_types.iter().enumerate() {
        let size = if source_type.is_empty() {
            "(40kb)".to_string()
        } else {
            format!("(40kb,{source_type})")
        };
        if i == 0 {
            text.push_str(&format!("Date: Mon, 2 Apr 2007 19:18:42 GMT   {size}\n"));
        } else {
            text.push_str(&format!(
                "Date (revised v{}): {} Mar 2012 08:00:00 GMT   {size}\n",
                i + 1,
                i + 1
            ));
        }
    }
    text.push_str("\\\\\n  Abstract text.\n\\\\\n");
    text
}

/// Write `content` at `key` below `root`, creating parent directories
pub fn write_object(root: &Path, key: &str, content: impl AsRef<[u8]>) {
    let path = root.join(key);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create object directory");
    }
    std::fs::write(path, content).expect("Failed to write object");
}

/// Storage tree rooted in a temporary directory, with a resolver over it
pub struct StorageTree {
    pub dir: TempDir,
    pub config: Config,
    pub articles: ArticleStore,
}

impl StorageTree {
    /// Create an empty tree using the default tier layout
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty tree; `storage_prefix` is replaced by the temporary directory
    pub fn with_config(config: Config) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = Config {
            storage_prefix: dir.path().to_string_lossy().into_owned(),
            ..config
        };
        let store = dissemination::object_store::from_config(&config)
            .expect("Failed to build local object store");
        let articles = ArticleStore::with_config(Arc::new(store), &config);
        Self {
            dir,
            config,
            articles,
        }
    }

    /// Write an object into the tree
    pub fn put(&self, key: &str, content: impl AsRef<[u8]>) {
        write_object(self.dir.path(), key, content);
    }

    /// A store over the same tree
    pub fn local_store(&self) -> LocalObjectStore {
        LocalObjectStore::new(self.dir.path())
    }
}

// The MIT License (MIT)
//
// Copyright (c) 2019-2022 Avimitin
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

/*!
purelink cleans whatever text lands on the clipboard. URLs lose their tracking
queries, short links can be expanded, cloud storage sharing pages become direct
downloads, and Windows paths get forward slashes (optionally mapped to
`/mnt/<drive>`) with quotes only where a space needs them. Anything else is
returned untouched.

## Usage

use purelink::{Cleaner, CleaningOptions};

#[tokio::main]
async fn main() {
    let cleaner = Cleaner::new().unwrap();
    let options = CleaningOptions::default();
    let result = cleaner.clean("https://example.com/?utm_source=x&id=1", options).await;
    assert_eq!(result, "https://example.com/?id=1")
}
*/

mod classify;
pub mod config;
mod filter;
pub mod hooks;
mod path;
pub mod resolver;
pub mod rules;
pub mod tools;
pub mod update;

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

pub use classify::{classify, Classification};
pub use config::{CleaningOptions, Config};
pub use path::normalize_path;
pub use resolver::LinkResolver;
pub use rules::{Blocklist, BlocklistStore};

/// Cleaner wraps the shared blocklist and the link resolver together with the
/// clean pipeline.
#[derive(Clone, Debug)]
pub struct Cleaner {
    store: Arc<BlocklistStore>,
    resolver: LinkResolver,
}

impl Cleaner {
    /// A cleaner using the built-in default blocklist.
    pub fn new() -> reqwest::Result<Cleaner> {
        Ok(Self::with_store(
            Arc::new(BlocklistStore::default()),
            LinkResolver::new()?,
        ))
    }

    pub fn with_store(store: Arc<BlocklistStore>, resolver: LinkResolver) -> Cleaner {
        Cleaner { store, resolver }
    }

    /// This function read the blocklist from a JSON rules file, creating the
    /// file with the default list when it doesn't exist.
    ///
    /// # Error
    ///
    /// Return error when the HTTP client can't be built. A broken rules file
    /// only logs a warning and falls back to the default list.
    pub fn from_file<P: AsRef<Path> + Debug>(path: P) -> anyhow::Result<Cleaner> {
        let store = Arc::new(BlocklistStore::default());
        if let Err(error) = store.load_or_init(&path) {
            tracing::warn!("use default rules, fail to load {path:?}: {error}");
        }
        Ok(Self::with_store(store, LinkResolver::new()?))
    }

    /// Handle to the blocklist, for reloads and remote updates.
    pub fn store(&self) -> &Arc<BlocklistStore> {
        &self.store
    }

    /// Amount of tracking parameters currently blocked.
    pub fn amount(&self) -> usize {
        self.store.snapshot().len()
    }

    /// Clean `input` according to `options`. Never fails: whatever can't be
    /// handled comes back as the least modified string.
    ///
    /// With `unshorten` set this may wait for up to two network timeouts, so
    /// keep it off any thread that has to stay responsive.
    pub async fn clean(&self, input: &str, options: CleaningOptions) -> String {
        let trimmed = input.trim();
        match classify(trimmed) {
            Classification::LocalPath(path) => normalize_path(path, options.posix_path_mode),
            Classification::Url(url) => {
                // One snapshot for the whole operation, a concurrent replace
                // won't be seen halfway through.
                let blocklist = self.store.snapshot();
                let cleaned = filter::clear(url, options, &blocklist, &self.resolver).await;
                if cleaned == trimmed {
                    input.to_owned()
                } else {
                    cleaned
                }
            }
            Classification::Passthrough(_) => input.to_owned(),
        }
    }
}

// vim: tw=80 fo+=t

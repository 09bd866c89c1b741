#![allow(clippy::doc_markdown)] // Generated file contains OPT_LEVEL without backticks

use std::sync::LazyLock;

include!(concat!(env!("OUT_DIR"), "/built.rs"));

/// Package version plus git commit metadata when available.
pub static VERSION: LazyLock<String> = LazyLock::new(|| match GIT_COMMIT_HASH_SHORT {
    Some(hash) if GIT_DIRTY == Some(true) => format!("{PKG_VERSION}-{hash}-dirty"),
    Some(hash) => format!("{PKG_VERSION}-{hash}"),
    None => PKG_VERSION.to_string(),
});

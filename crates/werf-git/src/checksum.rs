use sha2::{Digest, Sha256};

/// Hash accumulator behind walk and status checksums.
///
/// Each record is a tag followed by its fields, NUL-separated. Every tag has
/// a fixed field count, so distinct record sequences never collide.
pub(crate) struct Checksum {
    hasher: Sha256,
}

impl Checksum {
    pub(crate) fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    pub(crate) fn record(&mut self, tag: &str, fields: &[&str]) {
        self.hasher.update(tag.as_bytes());
        for field in fields {
            self.hasher.update([0u8]);
            self.hasher.update(field.as_bytes());
        }
        self.hasher.update(b"\n");
    }

    pub(crate) fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Hex sha256 of raw content.
pub fn content_hash(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Stand-in hash for a submodule that cannot be read at `path`.
///
/// Derived from the path alone, so it never equals a real object id and
/// stays stable until the submodule is initialized.
pub(crate) fn not_initialized_sentinel(path: &str) -> String {
    let mut checksum = Checksum::new();
    checksum.record("not-initialized-submodule", &[path]);
    checksum.finish()
}

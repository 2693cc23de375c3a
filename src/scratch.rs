use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::session::random_token;

const MAX_NAME_CHARS: usize = 64;
const FALLBACK_NAME: &str = "upload";

static UNSAFE_NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]+").expect("hardcoded file name regex is valid")
});

/// Drops any directory part a client may have sent along with the name.
pub fn client_file_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim()
}

pub fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

pub fn has_extension(name: &str, extensions: &[&str]) -> bool {
    name.rsplit_once('.').is_some_and(|(_, extension)| {
        extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    })
}

fn sanitize(name: &str) -> String {
    let cleaned = UNSAFE_NAME_CHARS.replace_all(name, "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.chars().take(MAX_NAME_CHARS).collect()
    }
}

/// Shared directory that stages uploads and generated files.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserves an input/output path pair for one request. A fresh random
    /// token keeps concurrent uploads with the same name apart.
    pub fn allocate(&self, original_name: &str, output_extension: &str) -> ScratchFiles {
        let token = random_token();
        let name = sanitize(client_file_name(original_name));
        let stem = file_stem(&name);

        ScratchFiles {
            input: self.root.join(format!("input_{token}_{name}")),
            output: self
                .root
                .join(format!("output_{token}_{stem}.{output_extension}")),
        }
    }
}

/// Input/output paths for one request; both files are removed on drop.
#[derive(Debug)]
pub struct ScratchFiles {
    input: PathBuf,
    output: PathBuf,
}

impl ScratchFiles {
    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

fn remove_if_present(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed scratch file"),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => warn!(path = %path.display(), %error, "failed to remove scratch file"),
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        remove_if_present(&self.input);
        remove_if_present(&self.output);
    }
}

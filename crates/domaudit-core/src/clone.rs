use crate::command::CommandRunner;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Clones repositories into uniquely named directories.
///
/// The directory counter is owned by the instance, so duplicate or
/// unparseable URLs never collide on disk and tests get a fresh sequence by
/// constructing a new `Cloner`.
pub struct Cloner {
    counter: AtomicU64,
}

impl Cloner {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(1),
        }
    }

    /// Derive the clone directory name for `url`: `{n}-{owner}:{name}` for a
    /// recognized GitHub URL, `{n}-unknown-name` otherwise. `n` is strictly
    /// increasing across calls, repeated URLs included.
    pub fn derive_directory_name(&self, url: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        if let Ok(matcher) =
            Regex::new(r"^https://github\.com/(?P<owner>[a-zA-Z_0-9-]+)/(?P<name>[a-zA-Z_0-9-]+)(\.git)?$")
        {
            if let Some(captures) = matcher.captures(url) {
                return format!("{}-{}:{}", n, &captures["owner"], &captures["name"]);
            }
        }
        format!("{}-unknown-name", n)
    }

    /// Clone `url` into `target`. Returns the captured command output as the
    /// failure text when the clone exits non-zero or cannot be spawned.
    pub async fn clone_into(
        &self,
        runner: &CommandRunner,
        url: &str,
        target: &Path,
    ) -> Result<PathBuf, String> {
        let target_text = target.display().to_string();
        // Batch mode: never block on a credential prompt.
        let output = runner
            .run(
                "git",
                &["-c", "core.askPass=echo", "clone", url, &target_text],
                None,
            )
            .await;
        if !output.succeeded() {
            return Err(format!("failed to clone {}: {}", url, output.text));
        }
        Ok(target.to_path_buf())
    }
}

impl Default for Cloner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_owner_and_name_from_github_urls() {
        let cloner = Cloner::new();
        assert_eq!(
            cloner.derive_directory_name("https://github.com/foo/bar"),
            "1-foo:bar"
        );
        assert_eq!(
            cloner.derive_directory_name("https://github.com/my_org/some-repo.git"),
            "2-my_org:some-repo"
        );
    }

    #[test]
    fn falls_back_to_unknown_name_for_unrecognized_urls() {
        let cloner = Cloner::new();
        assert_eq!(
            cloner.derive_directory_name("https://example.com/foo/bar"),
            "1-unknown-name"
        );
        assert_eq!(cloner.derive_directory_name("not a url"), "2-unknown-name");
    }

    #[test]
    fn counter_increases_for_repeated_urls() {
        let cloner = Cloner::new();
        let first = cloner.derive_directory_name("https://github.com/foo/bar");
        let second = cloner.derive_directory_name("https://github.com/foo/bar");
        assert_eq!(first, "1-foo:bar");
        assert_eq!(second, "2-foo:bar");
    }
}

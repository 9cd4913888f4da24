#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// `blockpage` command isolated from the user's config and token.
#[allow(dead_code)]
pub fn blockpage_cmd(config_path: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("blockpage"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("BLOCKPAGE_API_TOKEN");
    cmd.env("BLOCKPAGE_CONFIG", config_path);
    cmd
}

/// Write a config pointing the API at `base_url` and the cache under `root`.
#[allow(dead_code)]
pub fn write_config(config_path: &Path, base_url: &str, root: &Path) {
    let content = format!(
        "[api]\nbase_url = \"{base_url}\"\n\n[assets]\nroot = \"{}\"\n",
        root.display().to_string().replace('\\', "\\\\")
    );
    std::fs::write(config_path, content).unwrap();
}

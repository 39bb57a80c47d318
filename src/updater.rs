//! GitHub-releases self-update.
//!
//! The update flow mirrors the setup-version product: poll the latest
//! release, compare dotted numeric versions, download the installer asset
//! into a temp directory and hand off to it detached. The caller exits so
//! the installer can replace files.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::process::Command;
use std::time::Duration;
use tracing::info;

use crate::errors::{EzTextError, Result};

const USER_AGENT: &str = "ezText-AutoUpdater";
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

// ----- Version -----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    parts: Vec<u32>,
}

impl Version {
    /// Accepts an optional 'v' prefix; every dot-separated part must be
    /// numeric.
    pub fn parse(version_str: &str) -> Result<Self> {
        let trimmed = version_str.trim().trim_start_matches('v');
        let parts = trimmed
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| EzTextError::VersionParse {
                tag: version_str.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Version { parts })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.parts.iter().map(u32::to_string).collect();
        f.write_str(&rendered.join("."))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // compare part-wise, zero-padding the shorter version
        let max_len = self.parts.len().max(other.parts.len());
        for i in 0..max_len {
            let own = self.parts.get(i).copied().unwrap_or(0);
            let theirs = other.parts.get(i).copied().unwrap_or(0);
            match own.cmp(&theirs) {
                std::cmp::Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        std::cmp::Ordering::Equal
    }
}

// ----- GitHub release API -----

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    pub version: Version,
    pub download_url: Option<String>,
    pub release_notes: String,
    pub html_url: String,
}

pub struct UpdateChecker {
    current: Version,
    api_url: String,
}

impl UpdateChecker {
    pub fn new(current_version: &str, repo_owner: &str, repo_name: &str) -> Result<Self> {
        Ok(Self {
            current: Version::parse(current_version)?,
            api_url: format!(
                "https://api.github.com/repos/{repo_owner}/{repo_name}/releases/latest"
            ),
        })
    }

    /// `Ok(Some(..))` when the latest published release is newer than the
    /// running version.
    pub fn check(&self) -> Result<Option<ReleaseInfo>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(CHECK_TIMEOUT)
            .build()?;
        let response = client
            .get(&self.api_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()?;
        if !response.status().is_success() {
            return Err(EzTextError::GitHubApi(format!(
                "release query returned {}",
                response.status()
            )));
        }
        let release: Release = response.json()?;
        let latest = Version::parse(&release.tag_name)?;
        if latest <= self.current {
            return Ok(None);
        }
        Ok(Some(ReleaseInfo {
            version: latest,
            download_url: installer_asset(&release.assets),
            release_notes: release.body,
            html_url: release.html_url,
        }))
    }
}

/// First release asset that looks like a Windows installer.
fn installer_asset(assets: &[Asset]) -> Option<String> {
    assets
        .iter()
        .find(|asset| {
            let name = asset.name.to_lowercase();
            name.contains("setup") && name.ends_with(".exe")
        })
        .map(|asset| asset.browser_download_url.clone())
}

/// Download the installer into a fresh temp directory and launch it
/// detached. The caller is expected to exit afterwards so the installer
/// can replace the application files.
pub fn download_and_launch(download_url: &str) -> Result<()> {
    let client = reqwest::blocking::Client::builder().timeout(None).build()?;
    let bytes = client
        .get(download_url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()?
        .error_for_status()?
        .bytes()?;

    let dir = tempfile::Builder::new()
        .prefix("eztext_update_")
        .tempdir()?
        .into_path();
    let installer_path = dir.join("ezText_Setup.exe");
    fs::write(&installer_path, &bytes)?;

    info!(path = %installer_path.display(), "launching installer");
    let mut command = Command::new(&installer_path);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        use winapi::um::winbase::DETACHED_PROCESS;
        command.creation_flags(DETACHED_PROCESS);
    }
    command
        .spawn()
        .map_err(|e| EzTextError::Process(format!("failed to start installer: {e}")))?;
    Ok(())
}

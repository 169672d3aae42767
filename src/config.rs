use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::warn;

use crate::model::AMOUNT_MAX;
use crate::scheduler::DEFAULT_TICK;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) tick_ms: u64,
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    pub(crate) default_amount: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK.as_millis() as u64,
            fps_cap: 30,
            enable_color: true,
            default_amount: 5,
        }
    }
}

impl Settings {
    pub(crate) fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub(crate) fn frame_time(&self) -> Duration {
        let fps = self.fps_cap.clamp(10, 240);
        Duration::from_secs_f32(1.0 / fps as f32)
    }

    /// Text the feed/play entries start with.
    pub(crate) fn default_amount_text(&self) -> String {
        self.default_amount.min(AMOUNT_MAX).to_string()
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "neopet", "Neopet")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("neopet.log"),
    })
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    let Ok(s) = fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str::<Settings>(&s) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed settings");
            Settings::default()
        }
    }
}

/// Writes defaults so there is a file to edit; leaves an existing one alone.
pub(crate) fn ensure_settings_file(path: &Path, s: &Settings) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    save_settings_atomic(path, s)
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file fails on Windows
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("renaming to {}", to.display()))?;
    Ok(())
}

use std::path::PathBuf;

use super::job::Job;
use super::settings::Settings;

/// ジョブ単位で上書き可能な設定をまとめたもの。
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub cache_dir: Option<PathBuf>,
}

impl MergedConfig {
    /// `cache: false` のジョブはSettingsにcache_dirがあってもキャッシュを使わない。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        let use_cache = job.cache.unwrap_or(true);
        MergedConfig {
            cache_dir: settings.cache_dir.clone().filter(|_| use_cache),
        }
    }
}

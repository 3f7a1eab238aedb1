use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::fs;
use tokio::sync::Mutex;

use crate::core::scheduler::SharedWriter;
use crate::models::run_config::RunConfig;

/// 本次进程的结果目录: results/<策略>-<时间戳>
pub fn base_folder(policy_label: &str) -> PathBuf {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let stamp = OffsetDateTime::now_utc()
        .format(&fmt)
        .unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from("results").join(format!("{policy_label}-{stamp}"))
}

/// 文件名编码场景参数, 速率保留两位小数
pub fn sample_file_name(config: &RunConfig) -> String {
    format!(
        "{}-{}s-{}-{:.2}.txt",
        config.target_name,
        config.test_duration.as_secs(),
        config.number_of_clients,
        config.requests_per_second
    )
}

pub async fn open_sample_writer(
    folder: &Path,
    config: &RunConfig,
) -> anyhow::Result<SharedWriter> {
    fs::create_dir_all(folder)
        .await
        .with_context(|| format!("创建结果目录失败: {}", folder.display()))?;
    let path = folder.join(sample_file_name(config));
    let file = fs::File::create(&path)
        .await
        .with_context(|| format!("创建结果文件失败: {}", path.display()))?;
    Ok(Arc::new(Mutex::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn file_name_encodes_all_scenario_parameters() {
        let config = RunConfig::new("echo", Duration::from_secs(5), 2, 2.0);
        assert_eq!(sample_file_name(&config), "echo-5s-2-2.00.txt");
    }

    #[test]
    fn rate_keeps_two_decimals() {
        let config = RunConfig::new("api", Duration::from_secs(120), 8, 0.5);
        assert_eq!(sample_file_name(&config), "api-120s-8-0.50.txt");
    }

    #[test]
    fn base_folder_is_under_results_with_policy_label() {
        let folder = base_folder("delay-rate");
        assert!(folder.starts_with("results"));
        assert!(folder
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("delay-rate-"));
    }
}

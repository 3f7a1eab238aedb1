use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// 线程池硬上限, 逻辑客户端再多也不超过这个数
pub const MAX_POOL_THREADS: usize = 32;

/// 单个场景的全部参数, 压测开始后不可变
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub target_name: String,
    #[serde(rename = "test_duration_secs", deserialize_with = "duration_from_secs")]
    pub test_duration: Duration,
    pub number_of_clients: usize,
    pub requests_per_second: f64,
}

fn duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(Duration::from_secs(secs))
}

impl RunConfig {
    pub fn new(
        target_name: &str,
        test_duration: Duration,
        number_of_clients: usize,
        requests_per_second: f64,
    ) -> Self {
        RunConfig {
            target_name: target_name.to_string(),
            test_duration,
            number_of_clients,
            requests_per_second,
        }
    }

    /// 实际执行位数量: min(32, min(客户端数, 客户端数×速率)), 不会小于1
    pub fn pool_size(&self) -> usize {
        let by_rate = (self.number_of_clients as f64 * self.requests_per_second) as usize;
        self.number_of_clients
            .min(by_rate)
            .min(MAX_POOL_THREADS)
            .max(1)
    }

    /// 单个逻辑客户端的请求周期, 注意不按客户端数摊薄:
    /// 每个客户端独立按requests_per_second发压, 总速率随客户端数线性增长
    pub fn period(&self) -> Duration {
        Duration::from_millis(((1000.0 / self.requests_per_second) as u64).max(1))
    }

    /// 预期请求总数, 只用于日志
    pub fn expected_requests(&self) -> f64 {
        self.number_of_clients as f64
            * self.test_duration.as_secs() as f64
            * self.requests_per_second
    }
}

use std::time::Duration;

use async_trait::async_trait;

/// 请求器: 对绑定目标发起一次请求并给出延迟, 同时能读到累计能耗计数器。
/// 同一轮压测的所有worker共享一个实例, 要求可并发调用。
#[async_trait]
pub trait RequestMaker: Send + Sync {
    async fn make_request(&self) -> anyhow::Result<Duration>;

    /// 累计能耗读数（微焦）, 压测期间单调不减
    fn energy_micro_joules(&self) -> anyhow::Result<u64>;
}

/// 纯能耗传感器, 基线测量直接使用
pub trait EnergySensor: Send + Sync {
    fn energy_micro_joules(&self) -> anyhow::Result<u64>;
}

/// 某一时刻的cpu计数快照
#[derive(Debug, Clone, Copy)]
pub struct CpuSnapshot {
    busy_ticks: u64,
    total_ticks: u64,
}

impl CpuSnapshot {
    pub fn new(busy_ticks: u64, total_ticks: u64) -> Self {
        CpuSnapshot {
            busy_ticks,
            total_ticks,
        }
    }

    /// 与更早的快照求差, 得到区间内的cpu占用率（0.0~1.0）
    pub fn diff_from(&self, earlier: &CpuSnapshot) -> f64 {
        let busy = self.busy_ticks.saturating_sub(earlier.busy_ticks) as f64;
        let total = self.total_ticks.saturating_sub(earlier.total_ticks) as f64;
        if total == 0.0 {
            0.0
        } else {
            busy / total
        }
    }
}

pub trait CpuSensor: Send + Sync {
    fn snapshot(&self) -> anyhow::Result<CpuSnapshot>;
}

/// 被测进程（或附属进程, 比如数据库）: start返回的guard在drop时负责停止进程,
/// 保证任何退出路径都不泄漏
pub trait ServerProcess: Send + Sync {
    fn name(&self) -> &str;

    fn start(&self) -> anyhow::Result<ProcessGuard>;
}

pub struct ProcessGuard {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl ProcessGuard {
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        ProcessGuard {
            stop: Some(Box::new(stop)),
        }
    }

    /// 不需要停止动作的进程（比如外部已经在跑的服务）
    pub fn noop() -> Self {
        ProcessGuard { stop: None }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use watt_bench_engine::core::capability::{
    CpuSensor, CpuSnapshot, EnergySensor, RequestMaker,
};

/// 固定延迟的假请求器, 记录每次请求的发起时刻
pub struct FakeMaker {
    latency: Duration,
    pub starts: Mutex<Vec<Instant>>,
    energy: Arc<FakeEnergySensor>,
    fail_on: Option<usize>,
    calls: AtomicUsize,
}

impl FakeMaker {
    pub fn new(latency: Duration, energy: Arc<FakeEnergySensor>) -> Self {
        FakeMaker {
            latency,
            starts: Mutex::new(Vec::new()),
            energy,
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// 第n次调用返回错误（从1开始数）
    pub fn failing_on(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestMaker for FakeMaker {
    async fn make_request(&self) -> anyhow::Result<Duration> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.starts.lock().push(Instant::now());
        if self.fail_on == Some(n) {
            anyhow::bail!("第{n}次请求注定失败");
        }
        tokio::time::sleep(self.latency).await;
        Ok(self.latency)
    }

    fn energy_micro_joules(&self) -> anyhow::Result<u64> {
        self.energy.energy_micro_joules()
    }
}

/// 依次吐出预设读数, 用完后停在最后一个
pub struct FakeEnergySensor {
    readings: Mutex<Vec<u64>>,
}

impl FakeEnergySensor {
    pub fn with_readings(readings: &[u64]) -> Arc<Self> {
        assert!(!readings.is_empty());
        Arc::new(FakeEnergySensor {
            readings: Mutex::new(readings.to_vec()),
        })
    }
}

impl EnergySensor for FakeEnergySensor {
    fn energy_micro_joules(&self) -> anyhow::Result<u64> {
        let mut readings = self.readings.lock();
        if readings.len() > 1 {
            Ok(readings.remove(0))
        } else {
            Ok(readings[0])
        }
    }
}

/// 每次快照都前进固定的tick数
#[derive(Default)]
pub struct FakeCpuSensor {
    snaps: AtomicU64,
}

impl CpuSensor for FakeCpuSensor {
    fn snapshot(&self) -> anyhow::Result<CpuSnapshot> {
        let n = self.snaps.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CpuSnapshot::new(10 * n, 100 * n))
    }
}

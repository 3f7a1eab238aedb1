use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::core::capability::{CpuSensor, CpuSnapshot, RequestMaker};
use crate::models::result::Results;

/// 延迟样本收集器: 只追加, 多个worker并发写入不需要额外加锁
#[derive(Default)]
pub struct SampleSet {
    samples: Mutex<Vec<Duration>>,
}

impl SampleSet {
    pub fn new() -> Arc<SampleSet> {
        Arc::new(SampleSet::default())
    }

    pub fn push(&self, sample: Duration) {
        self.samples.lock().push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 所有写入方停止后读取才是一致的完整视图
    pub fn snapshot(&self) -> Vec<Duration> {
        self.samples.lock().clone()
    }
}

/// 围绕一轮压测做资源统计: worker启动前捕获起始快照,
/// 全部join之后捕获结束快照, 产出Results
pub struct ResultsAggregator {
    name: String,
    samples: Arc<SampleSet>,
    start_energy: u64,
    cpu_start: CpuSnapshot,
    started: Instant,
}

impl ResultsAggregator {
    pub fn begin(
        name: &str,
        maker: &dyn RequestMaker,
        cpu: &dyn CpuSensor,
    ) -> anyhow::Result<Self> {
        Ok(ResultsAggregator {
            name: name.to_string(),
            samples: SampleSet::new(),
            start_energy: maker.energy_micro_joules().context("读取起始能耗失败")?,
            cpu_start: cpu.snapshot().context("获取起始cpu快照失败")?,
            started: Instant::now(),
        })
    }

    pub fn samples(&self) -> Arc<SampleSet> {
        self.samples.clone()
    }

    pub fn finish(
        self,
        maker: &dyn RequestMaker,
        cpu: &dyn CpuSensor,
    ) -> anyhow::Result<Results> {
        let end_energy = maker.energy_micro_joules().context("读取结束能耗失败")?;
        let cpu_end = cpu.snapshot().context("获取结束cpu快照失败")?;
        Ok(Results {
            name: self.name,
            latencies: self.samples.snapshot(),
            total_energy_micro_joules: end_energy.saturating_sub(self.start_energy) as i64,
            total_duration: self.started.elapsed(),
            cpu_delta: cpu_end.diff_from(&self.cpu_start),
        })
    }
}

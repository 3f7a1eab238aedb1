use std::time::Duration;

use anyhow::Context;
use tokio::time::{sleep, Instant};

use crate::core::capability::EnergySensor;
use crate::models::baseline::BaselineRecord;

/// 空闲基线测量: 第一次用到时才真正测, 之后整个进程生命周期内复用,
/// 不会失效也不会重测。作为显式状态传给编排器, 方便测试时注入
pub struct BaselineMeasurement {
    window: Duration,
    record: Option<BaselineRecord>,
}

impl BaselineMeasurement {
    pub fn new(window: Duration) -> Self {
        BaselineMeasurement {
            window,
            record: None,
        }
    }

    /// 跳过基线测量, 等价于零基线
    pub fn disabled() -> Self {
        BaselineMeasurement {
            window: Duration::ZERO,
            record: Some(BaselineRecord::default()),
        }
    }

    pub fn record(&self) -> Option<&BaselineRecord> {
        self.record.as_ref()
    }

    /// 已有基线时直接返回; 否则取一次能耗读数, 空转一个窗口, 再取一次
    pub async fn measure(&mut self, sensor: &dyn EnergySensor) -> anyhow::Result<BaselineRecord> {
        if let Some(record) = self.record {
            return Ok(record);
        }
        println!("测量空闲基线, 窗口{}秒", self.window.as_secs());
        let start_energy = sensor
            .energy_micro_joules()
            .context("读取基线起始能耗失败")?;
        let started = Instant::now();
        sleep(self.window).await;
        let end_energy = sensor
            .energy_micro_joules()
            .context("读取基线结束能耗失败")?;
        let record = BaselineRecord {
            energy_micro_joules: end_energy.saturating_sub(start_energy),
            measure_duration: started.elapsed(),
        };
        self.record = Some(record);
        Ok(record)
    }
}

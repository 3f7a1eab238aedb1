use std::fmt;
use std::time::Duration;

use crate::models::baseline::BaselineRecord;

/// 单个场景的压测结果, 构造后不再变化
#[derive(Debug, Clone)]
pub struct Results {
    pub name: String,
    /// 全部延迟样本, 同一客户端内部按发起顺序排列
    pub latencies: Vec<Duration>,
    /// 净能耗（微焦）, 扣除基线后可能为负, 原样保留不截断
    pub total_energy_micro_joules: i64,
    /// 整个压测的墙钟时长, 不是各请求延迟之和
    pub total_duration: Duration,
    pub cpu_delta: f64,
}

impl Results {
    /// 扣除基线能耗: 直接减去基线读数, 不按时长折算
    pub fn subtract_baseline(mut self, baseline: &BaselineRecord) -> Results {
        self.total_energy_micro_joules -= baseline.energy_micro_joules as i64;
        self
    }

    /// 实际达成的每秒请求数
    pub fn realized_rps(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.latencies.len() as f64 / secs
        }
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: 样本{}条, 净能耗{}µJ, 总时长{:.2}s, cpu占用{:.2}%",
            self.name,
            self.latencies.len(),
            self.total_energy_micro_joules,
            self.total_duration.as_secs_f64(),
            self.cpu_delta * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(energy: i64) -> Results {
        Results {
            name: "echo".to_string(),
            latencies: vec![Duration::from_millis(10); 4],
            total_energy_micro_joules: energy,
            total_duration: Duration::from_secs(2),
            cpu_delta: 0.5,
        }
    }

    #[test]
    fn subtract_baseline_removes_raw_baseline_energy() {
        let baseline = BaselineRecord {
            energy_micro_joules: 1000,
            measure_duration: Duration::from_secs(1),
        };
        // 基线窗口1秒, 压测2秒: 依然只减原始基线值, 不折算
        let net = results(5000).subtract_baseline(&baseline);
        assert_eq!(net.total_energy_micro_joules, 4000);
    }

    #[test]
    fn subtract_baseline_may_go_negative() {
        let baseline = BaselineRecord {
            energy_micro_joules: 1000,
            measure_duration: Duration::from_secs(1),
        };
        let net = results(500).subtract_baseline(&baseline);
        assert_eq!(net.total_energy_micro_joules, -500);
    }

    #[test]
    fn realized_rps_uses_wall_clock() {
        assert_eq!(results(0).realized_rps(), 2.0);
    }
}

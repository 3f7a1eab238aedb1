use std::fmt::Write as _;

use histogram::Histogram;

use crate::models::result::Results;

pub struct LatencyStats {
    pub median: u64,
    pub p95: u64,
    pub p99: u64,
    pub max: u64,
    pub min: u64,
}

/// 从原始样本算分位数, 口径与毫秒为单位的直方图一致
pub fn latency_stats(results: &Results) -> LatencyStats {
    let mut max = 0u64;
    let mut min = u64::MAX;
    let mut histogram = Histogram::new(10, 20).ok();
    for latency in &results.latencies {
        let ms = latency.as_millis() as u64;
        max = max.max(ms);
        min = min.min(ms);
        if let Some(h) = histogram.as_mut() {
            let _ = h.increment(ms);
        }
    }
    if results.latencies.is_empty() {
        min = 0;
    }
    let percentile = |p: f64| -> u64 {
        histogram
            .as_ref()
            .and_then(|h| h.percentile(p).ok())
            .map(|bucket| *bucket.range().start())
            .unwrap_or(0)
    };
    LatencyStats {
        median: percentile(50.0),
        p95: percentile(95.0),
        p99: percentile(99.0),
        max,
        min,
    }
}

/// 批量压测的汇总文本, 每个场景一行, 按执行顺序排列
pub fn combined_report(all: &[Results]) -> String {
    let mut out = String::new();
    for results in all {
        let stats = latency_stats(results);
        let _ = writeln!(
            out,
            "{}: 样本{}条, 实际rps {:.2}, 中位{}ms, 95线{}ms, 99线{}ms, 最大{}ms, 最小{}ms, 净能耗{}µJ, 总时长{:.2}s, cpu占用{:.2}%",
            results.name,
            results.latencies.len(),
            results.realized_rps(),
            stats.median,
            stats.p95,
            stats.p99,
            stats.max,
            stats.min,
            results.total_energy_micro_joules,
            results.total_duration.as_secs_f64(),
            results.cpu_delta * 100.0
        );
    }
    out
}

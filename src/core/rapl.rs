use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use crate::core::capability::{CpuSensor, CpuSnapshot, EnergySensor};

const RAPL_ENERGY_FILE: &str = "/sys/class/powercap/intel-rapl:0/energy_uj";
const PROC_STAT_FILE: &str = "/proc/stat";

/// rapl能耗计数器（微焦, 单调递增, 内核负责溢出回绕前的读数）
pub struct RaplSensor {
    path: PathBuf,
}

impl RaplSensor {
    pub fn new() -> Self {
        RaplSensor {
            path: PathBuf::from(RAPL_ENERGY_FILE),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        RaplSensor { path: path.into() }
    }
}

impl Default for RaplSensor {
    fn default() -> Self {
        RaplSensor::new()
    }
}

impl EnergySensor for RaplSensor {
    fn energy_micro_joules(&self) -> anyhow::Result<u64> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("读取rapl计数器失败: {}", self.path.display()))?;
        raw.trim()
            .parse::<u64>()
            .with_context(|| format!("解析rapl计数器失败: {:?}", raw.trim()))
    }
}

/// 从/proc/stat第一行取整机cpu快照
pub struct ProcStatCpuSensor {
    path: PathBuf,
}

impl ProcStatCpuSensor {
    pub fn new() -> Self {
        ProcStatCpuSensor {
            path: PathBuf::from(PROC_STAT_FILE),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        ProcStatCpuSensor { path: path.into() }
    }
}

impl Default for ProcStatCpuSensor {
    fn default() -> Self {
        ProcStatCpuSensor::new()
    }
}

impl CpuSensor for ProcStatCpuSensor {
    fn snapshot(&self) -> anyhow::Result<CpuSnapshot> {
        let stat = fs::read_to_string(&self.path)
            .with_context(|| format!("读取cpu统计失败: {}", self.path.display()))?;
        let first = stat.lines().next().context("cpu统计文件为空")?;
        // cpu  user nice system idle iowait irq softirq steal ...
        let fields: Vec<u64> = first
            .split_whitespace()
            .skip(1)
            .map(str::parse)
            .collect::<Result<_, _>>()
            .with_context(|| format!("解析cpu行失败: {:?}", first))?;
        anyhow::ensure!(fields.len() >= 4, "cpu行字段不足: {:?}", first);
        let total: u64 = fields.iter().sum();
        let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
        Ok(CpuSnapshot::new(total - idle, total))
    }
}

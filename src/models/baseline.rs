use std::time::Duration;

/// 空闲基线: 测量窗口内系统什么都不做时的能耗
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineRecord {
    pub energy_micro_joules: u64,
    pub measure_duration: Duration,
}

#[cfg(not(target_os = "windows"))]
use std::process::Child;
#[cfg(any(target_os = "linux", target_os = "macos"))]
use std::process::Command;

#[cfg(target_os = "windows")]
use winapi::um::winbase::SetThreadExecutionState;
#[cfg(target_os = "windows")]
use winapi::um::winnt::{ES_CONTINUOUS, ES_SYSTEM_REQUIRED};

/// 测量期间保持系统唤醒, drop时恢复。系统睡眠会直接毁掉能耗读数
pub(crate) struct KeepAwake {
    enabled: bool,
    #[cfg(not(target_os = "windows"))]
    inhibitor: Option<Child>,
}

impl KeepAwake {
    pub(crate) fn new(enabled: bool) -> Self {
        let mut guard = KeepAwake {
            enabled,
            #[cfg(not(target_os = "windows"))]
            inhibitor: None,
        };
        if enabled {
            guard.engage();
        }
        guard
    }

    #[cfg(target_os = "windows")]
    fn engage(&mut self) {
        unsafe {
            SetThreadExecutionState(ES_CONTINUOUS | ES_SYSTEM_REQUIRED);
        }
    }

    #[cfg(target_os = "macos")]
    fn engage(&mut self) {
        self.inhibitor = Command::new("caffeinate").spawn().ok();
    }

    #[cfg(target_os = "linux")]
    fn engage(&mut self) {
        self.inhibitor = Command::new("systemd-inhibit")
            .arg("--what=handle-lid-switch:sleep:idle")
            .arg("--who=watt-bench-engine")
            .arg("--why=energy measurement in progress")
            .arg("--mode=block")
            .spawn()
            .ok();
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    fn engage(&mut self) {}
}

impl Drop for KeepAwake {
    fn drop(&mut self) {
        if self.enabled {
            #[cfg(target_os = "windows")]
            unsafe {
                SetThreadExecutionState(ES_CONTINUOUS);
            }

            #[cfg(not(target_os = "windows"))]
            if let Some(mut child) = self.inhibitor.take() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }
}

use std::process::Command;

use anyhow::Context;

use crate::core::capability::{ProcessGuard, ServerProcess};

/// 以命令行方式启动的被测进程, guard在drop时杀掉并回收子进程
pub struct ShellServerProcess {
    name: String,
    program: String,
    args: Vec<String>,
}

impl ShellServerProcess {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        ShellServerProcess {
            name: name.into(),
            program: program.into(),
            args,
        }
    }
}

impl ServerProcess for ShellServerProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> anyhow::Result<ProcessGuard> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .spawn()
            .with_context(|| format!("启动进程失败: {} ({})", self.name, self.program))?;
        Ok(ProcessGuard::new(move || {
            let mut child = child;
            let _ = child.kill();
            let _ = child.wait();
        }))
    }
}

/// 目标已经在外部运行时的占位进程, 启动和停止都是空操作
pub struct NullServerProcess {
    name: String,
}

impl NullServerProcess {
    pub fn new(name: impl Into<String>) -> Self {
        NullServerProcess { name: name.into() }
    }
}

impl ServerProcess for NullServerProcess {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> anyhow::Result<ProcessGuard> {
        Ok(ProcessGuard::noop())
    }
}

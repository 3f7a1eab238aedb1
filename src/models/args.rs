use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// 目标地址
    #[arg(short, long, default_value = "http://localhost:8080")]
    pub url: String,

    /// 目标名称
    #[arg(short, long, default_value = "default")]
    pub name: String,

    /// 持续时间（秒）
    #[arg(short, long, default_value_t = 60)]
    pub duration_secs: u64,

    /// 逻辑客户端数量
    #[arg(short, long, default_value_t = 1)]
    pub clients: usize,

    /// 每个客户端每秒请求数
    #[arg(short, long, default_value_t = 1.0)]
    pub rate: f64,

    /// 调度策略: delay（上次完成后等一个周期）或 rate（固定节拍）
    #[arg(short, long, default_value = "delay")]
    pub policy: String,

    /// 基线测量窗口（秒）
    #[arg(long, default_value_t = 30)]
    pub baseline_secs: u64,

    /// 跳过基线测量
    #[arg(long, default_value_t = false)]
    pub no_baseline: bool,

    /// 把每条延迟写入结果文件
    #[arg(short, long, default_value_t = false)]
    pub write_results: bool,

    /// 批量场景文件（json数组）
    #[arg(long)]
    pub scenarios: Option<String>,

    /// 压测期间阻止系统休眠
    #[arg(long, default_value_t = false)]
    pub prevent_sleep: bool,
}

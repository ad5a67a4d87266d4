use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "envsync=info";

/// 初始化 tracing：优先使用 `RUST_LOG`，否则只输出本 crate 的 info 日志。
/// 输出到 stderr，stdout 留给命令结果。
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}

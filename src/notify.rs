/// 面向用户的错误提示出口。发出即忘，不影响调用方状态。
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// 通过 tracing 输出提示
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// 命令行使用：直接写到 stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

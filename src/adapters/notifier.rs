use crate::domain::model::{Toast, ToastVariant};
use crate::domain::ports::Notifier;
use tokio::sync::mpsc;

/// 直接印到終端機（CLI 使用）
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        let description = toast.description.as_deref().unwrap_or("");
        match toast.variant {
            ToastVariant::Default => println!("✅ {} {}", toast.title, description),
            ToastVariant::Destructive => eprintln!("❌ {} {}", toast.title, description),
        }
    }
}

/// 把通知送進 channel，由 UI 端自行顯示
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Toast>,
}

impl ChannelNotifier {
    /// 建立通知端與接收端
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, toast: Toast) {
        if self.sender.send(toast).is_err() {
            tracing::warn!("⚠️ Toast receiver dropped, notification discarded");
        }
    }
}

/// 只寫進日誌
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        let description = toast.description.as_deref().unwrap_or("");
        match toast.variant {
            ToastVariant::Default => tracing::info!("🔔 {}: {}", toast.title, description),
            ToastVariant::Destructive => tracing::warn!("🔔 {}: {}", toast.title, description),
        }
    }
}

//! Notification facade.
//!
//! Maps semantic events to presentation calls. The hosting shell supplies
//! a [`Notifier`] (the toast system); this module decides icon and
//! timeout per severity and provides the fixed-template domain messages.
//! Display is fire-and-forget; nothing here affects control flow.

use std::sync::Arc;
use std::time::Duration;

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Default icon for the severity.
    pub fn icon(self) -> &'static str {
        match self {
            Severity::Success => "✅",
            Severity::Error => "❌",
            Severity::Warning => "⚠️",
            Severity::Info => "ℹ️",
        }
    }

    /// Default auto-dismiss timeout. Errors stay until dismissed.
    pub fn timeout(self) -> Option<Duration> {
        match self {
            Severity::Success => Some(Duration::from_secs(4)),
            Severity::Error => None,
            Severity::Warning => Some(Duration::from_secs(6)),
            Severity::Info => Some(Duration::from_secs(5)),
        }
    }
}

/// A notification ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    pub icon: &'static str,
    /// `None` means the toast does not auto-dismiss.
    pub timeout: Option<Duration>,
}

/// Presentation boundary: whatever renders toasts implements this.
pub trait Notifier: Send + Sync {
    fn show(&self, toast: Toast);
}

/// Semantic notification calls over an injected [`Notifier`].
#[derive(Clone)]
pub struct Notifications {
    sink: Arc<dyn Notifier>,
}

impl Notifications {
    pub fn new(sink: Arc<dyn Notifier>) -> Self {
        Self { sink }
    }

    fn emit(&self, severity: Severity, message: String) {
        self.sink.show(Toast {
            message,
            severity,
            icon: severity.icon(),
            timeout: severity.timeout(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(Severity::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Severity::Error, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(Severity::Warning, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Severity::Info, message.into());
    }

    /// Full control over icon and timeout.
    pub fn custom(
        &self,
        severity: Severity,
        message: impl Into<String>,
        icon: &'static str,
        timeout: Option<Duration>,
    ) {
        self.sink.show(Toast {
            message: message.into(),
            severity,
            icon,
            timeout,
        });
    }

    // Domain-specific wrappers.

    pub fn agendamento_confirmed(&self, cliente: &str, date: &str) {
        self.success(format!("Agendamento confirmado para {cliente} em {date}"));
    }

    pub fn agendamento_canceled(&self, cliente: &str) {
        self.warning(format!("Agendamento de {cliente} foi cancelado"));
    }

    pub fn agendamento_error(&self, error: &str) {
        self.error(format!("Erro no agendamento: {error}"));
    }

    pub fn save_success(&self) {
        self.success("Dados salvos com sucesso!");
    }

    pub fn validation_error(&self, field: &str) {
        self.error(format!("Por favor, verifique o campo: {field}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        toasts: Mutex<Vec<Toast>>,
    }

    impl Notifier for RecordingNotifier {
        fn show(&self, toast: Toast) {
            self.toasts.lock().unwrap().push(toast);
        }
    }

    fn recorder() -> (Notifications, Arc<RecordingNotifier>) {
        let sink = Arc::new(RecordingNotifier::default());
        (Notifications::new(sink.clone()), sink)
    }

    #[test]
    fn severities_carry_their_defaults() {
        let (notifications, sink) = recorder();

        notifications.success("salvo");
        notifications.error("falhou");
        notifications.warning("atenção");
        notifications.info("aviso");

        let toasts = sink.toasts.lock().unwrap();
        assert_eq!(toasts[0].timeout, Some(Duration::from_secs(4)));
        assert_eq!(toasts[0].icon, "✅");
        // Errors never auto-dismiss.
        assert_eq!(toasts[1].timeout, None);
        assert_eq!(toasts[2].timeout, Some(Duration::from_secs(6)));
        assert_eq!(toasts[3].timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn domain_wrappers_use_fixed_templates() {
        let (notifications, sink) = recorder();

        notifications.agendamento_confirmed("Ana", "20/08/2026");
        notifications.agendamento_canceled("Ana");
        notifications.agendamento_error("sem horário");
        notifications.save_success();
        notifications.validation_error("cpf");

        let toasts = sink.toasts.lock().unwrap();
        assert_eq!(
            toasts[0].message,
            "Agendamento confirmado para Ana em 20/08/2026"
        );
        assert_eq!(toasts[0].severity, Severity::Success);
        assert_eq!(toasts[1].message, "Agendamento de Ana foi cancelado");
        assert_eq!(toasts[1].severity, Severity::Warning);
        assert_eq!(toasts[2].message, "Erro no agendamento: sem horário");
        assert_eq!(toasts[3].message, "Dados salvos com sucesso!");
        assert_eq!(toasts[4].message, "Por favor, verifique o campo: cpf");
    }
}

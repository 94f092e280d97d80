//! UI/backend events and error modeling for desktop GUI controller.

use client_core::MessageKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

/// Everything the backend worker can ask the UI thread to change.
#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    Error(UiError),
    Message { text: String, kind: MessageKind },
    ClearMessage,
    Alert(String),
    ProgressVisible(bool),
    Progress(u8),
    ChartControlsVisible(bool),
    DisplayChart(Option<String>),
    ResetFileInput,
    Navigate(String),
    ChartImageLoaded { url: String, image: PreviewImage },
    ChartImageFailed { url: String, reason: String },
    Busy(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Storage,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    SelectFile,
    ChartPreview,
    SaveReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("transport")
            || message_lower.contains("connection")
            || message_lower.contains("timed out")
            || message_lower.contains("dns")
            || message_lower.contains("http status")
        {
            UiErrorCategory::Transport
        } else if message_lower.contains("invalid")
            || message_lower.contains("malformed")
            || message_lower.contains("decode")
            || message_lower.contains("unsupported")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("permission")
            || message_lower.contains("no such file")
            || message_lower.contains("read local file")
            || message_lower.contains("write")
        {
            UiErrorCategory::Storage
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// One-line text for the status bar.
    pub fn status_text(&self) -> String {
        let prefix = match self.context {
            UiErrorContext::BackendStartup => "Backend worker startup failure",
            UiErrorContext::SelectFile => "Could not read the selected file",
            UiErrorContext::ChartPreview => "Could not show the chart",
            UiErrorContext::SaveReport => "Could not save the report",
        };
        format!("{prefix}: {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_transport_failures() {
        let err = UiError::from_message(
            UiErrorContext::ChartPreview,
            "transport error: error sending request: connection refused",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.context(), UiErrorContext::ChartPreview);
    }

    #[test]
    fn classifies_local_file_failures_as_storage() {
        let err = UiError::from_message(
            UiErrorContext::SelectFile,
            "failed to read local file: No such file or directory (os error 2)",
        );
        assert_eq!(err.category(), UiErrorCategory::Storage);
        assert!(err
            .status_text()
            .starts_with("Could not read the selected file: "));
    }

    #[test]
    fn classifies_image_decode_failures_as_validation() {
        let err = UiError::from_message(
            UiErrorContext::ChartPreview,
            "The image format could not be determined (decode)",
        );
        assert_eq!(err.category(), UiErrorCategory::Validation);
    }
}

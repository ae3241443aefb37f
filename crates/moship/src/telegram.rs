//! Telegram notifier.
//!
//! Notification is a best-effort side channel: a missing `telegram.env` file
//! silently disables it, an incomplete file is a logged warning, and a failed
//! send never aborts the pipeline. The success message always carries the
//! install URL so a human can deep-link to the build without reading logs.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use moship_sdk::Platform;
use reqwest::blocking::Client;
use serde_json::json;

/// The notification credential file name, looked up in the app directory.
pub const TELEGRAM_ENV_FILE: &str = "telegram.env";

const API_BASE: &str = "https://api.telegram.org";
const USER_AGENT: &str = "moship/0.1";

/// Notification credentials from `telegram.env`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    /// Forum topic to post into, when the chat uses topics.
    pub topic_id: Option<String>,
}

impl TelegramConfig {
    /// Loads `telegram.env` from the app directory.
    ///
    /// Returns `None` when the file is absent (notification skipped
    /// silently) or present but incomplete (logged warning). Neither case is
    /// ever an error.
    pub fn load(app_dir: &Path) -> Option<Self> {
        let path = app_dir.join(TELEGRAM_ENV_FILE);
        if !path.exists() {
            return None;
        }

        let iter = match dotenvy::from_path_iter(&path) {
            Ok(iter) => iter,
            Err(err) => {
                eprintln!(
                    "Warning: cannot read {}: {}; notifications disabled",
                    path.display(),
                    err
                );
                return None;
            }
        };

        let mut bot_token = None;
        let mut chat_id = None;
        let mut topic_id = None;
        for item in iter {
            let (key, value) = match item {
                Ok(pair) => pair,
                Err(err) => {
                    eprintln!(
                        "Warning: malformed line in {}: {}; notifications disabled",
                        path.display(),
                        err
                    );
                    return None;
                }
            };
            match key.as_str() {
                "TELEGRAM_BOT_TOKEN" => bot_token = Some(value),
                "TELEGRAM_CHAT_ID" => chat_id = Some(value),
                "TELEGRAM_TOPIC_ID" => topic_id = Some(value),
                _ => {}
            }
        }

        match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                Some(Self {
                    bot_token,
                    chat_id,
                    topic_id: topic_id.filter(|t| !t.is_empty()),
                })
            }
            _ => {
                eprintln!(
                    "Warning: {} is missing TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID; notifications disabled",
                    path.display()
                );
                None
            }
        }
    }
}

/// Terminal pipeline outcome delivered to the channel.
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    Success {
        platform: Platform,
        version: String,
        app_name: String,
        install_url: String,
    },
    Failure {
        platform: Platform,
        version: String,
        error: String,
    },
}

/// Posts pipeline outcomes to a Telegram chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: Client,
    config: TelegramConfig,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            config,
            base_url: API_BASE.to_string(),
        })
    }

    /// Sends one message for a terminal pipeline outcome.
    ///
    /// The caller logs and swallows any returned error; nothing here may
    /// escalate to a pipeline failure.
    pub fn notify(&self, event: &PipelineEvent) -> Result<()> {
        let mut body = json!({
            "chat_id": self.config.chat_id,
            "text": format_message(event),
            "parse_mode": "HTML",
        });
        if let Some(topic_id) = &self.config.topic_id {
            match topic_id.parse::<i64>() {
                Ok(id) => {
                    body["message_thread_id"] = json!(id);
                }
                Err(_) => {
                    eprintln!(
                        "Warning: TELEGRAM_TOPIC_ID '{}' is not an integer; posting without a topic",
                        topic_id
                    );
                }
            }
        }

        let url = format!("{}/bot{}/sendMessage", self.base_url, self.config.bot_token);
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .context("sending Telegram notification")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(anyhow!(
                "Telegram API rejected the notification (status {}): {}",
                status,
                text
            ));
        }
        Ok(())
    }
}

fn format_message(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::Success {
            platform,
            version,
            app_name,
            install_url,
        } => format!(
            "\u{2705} <b>{}</b> {} ({}) released\nInstall: {}",
            html_escape(app_name),
            html_escape(version),
            platform,
            html_escape(install_url)
        ),
        PipelineEvent::Failure {
            platform,
            version,
            error,
        } => format!(
            "\u{274c} Release {} ({}) failed:\n<pre>{}</pre>",
            html_escape(version),
            platform,
            html_escape(error)
        ),
    }
}

/// Escapes the three characters Telegram's HTML parse mode reserves.
fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn absent_file_disables_notifications_silently() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(TelegramConfig::load(tmp.path()).is_none());
    }

    #[test]
    fn loads_complete_config_ignoring_comments_and_blanks() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join(TELEGRAM_ENV_FILE),
            "# release channel bot\n\nTELEGRAM_BOT_TOKEN=123:abc\nTELEGRAM_CHAT_ID=-1009\n\n# optional\nTELEGRAM_TOPIC_ID=42\n",
        )
        .unwrap();

        let config = TelegramConfig::load(tmp.path()).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.chat_id, "-1009");
        assert_eq!(config.topic_id.as_deref(), Some("42"));
    }

    #[test]
    fn incomplete_config_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join(TELEGRAM_ENV_FILE),
            "TELEGRAM_BOT_TOKEN=123:abc\n",
        )
        .unwrap();
        assert!(TelegramConfig::load(tmp.path()).is_none());
    }

    #[test]
    fn topic_id_is_optional() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join(TELEGRAM_ENV_FILE),
            "TELEGRAM_BOT_TOKEN=123:abc\nTELEGRAM_CHAT_ID=-1009\n",
        )
        .unwrap();
        let config = TelegramConfig::load(tmp.path()).unwrap();
        assert!(config.topic_id.is_none());
    }

    #[test]
    fn success_message_carries_install_url() {
        let msg = format_message(&PipelineEvent::Success {
            platform: Platform::Android,
            version: "1.2.3".into(),
            app_name: "demo_app".into(),
            install_url: "https://d.example.com/install/42".into(),
        });
        assert!(msg.contains("demo_app"));
        assert!(msg.contains("1.2.3"));
        assert!(msg.contains("android"));
        assert!(msg.contains("https://d.example.com/install/42"));
    }

    #[test]
    fn failure_message_escapes_error_text() {
        let msg = format_message(&PipelineEvent::Failure {
            platform: Platform::Ios,
            version: "1.0.0".into(),
            error: "exit <status> & output".into(),
        });
        assert!(msg.contains("exit &lt;status&gt; &amp; output"));
        assert!(!msg.contains("<status>"));
    }
}

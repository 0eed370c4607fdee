//! Minimal Telegram Bot API client

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Callback data prefix of the claim button.
const CLAIM_PREFIX: &str = "gift ";

/// Telegram client errors
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Request failed before an API answer arrived
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The Bot API rejected the call
    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    /// `ok` without a `result`
    #[error("Bot API returned no result for {0}")]
    EmptyResult(&'static str),

    /// Request body could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Local file could not be read for upload
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TelegramError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the bot token.
        TelegramError::Http(err.without_url())
    }
}

impl TelegramError {
    /// The target message no longer exists.
    pub fn is_message_missing(&self) -> bool {
        matches!(self, TelegramError::Api { code: 400, description }
            if description.to_lowercase().contains("not found"))
    }

    /// An edit that would not change the message.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, TelegramError::Api { code: 400, description }
            if description.contains("message is not modified"))
    }
}

pub type TelegramResult<T> = Result<T, TelegramError>;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Serialize)]
struct GetUpdates<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

/// Body of editMessageText and editMessageCaption. Leaving out the markup
/// removes the inline keyboard.
#[derive(Debug, Serialize)]
struct EditMessage<'a> {
    chat_id: &'a str,
    message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct DeleteMessage<'a> {
    chat_id: &'a str,
    message_id: i64,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQuery<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// Incoming update
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    /// First and last name separated by a space.
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardMarkup {
    /// Single claim button for `gift`.
    pub fn claim(label: &str, gift: &str) -> Self {
        Self {
            inline_keyboard: vec![vec![InlineKeyboardButton {
                text: label.to_string(),
                callback_data: format!("{CLAIM_PREFIX}{gift}"),
            }]],
        }
    }
}

/// Gift id carried by a claim button, if `data` is one.
pub fn parse_claim_data(data: &str) -> Option<&str> {
    data.strip_prefix(CLAIM_PREFIX)
        .map(str::trim)
        .filter(|gift| !gift.is_empty())
}

/// Bot API client bound to one bot token.
pub struct TelegramClient {
    http: Client,
    base_url: String,
}

impl TelegramClient {
    /// `request_timeout` must exceed the long-poll timeout of `get_updates`.
    pub fn new(api_base: &str, token: &str, request_timeout: Duration) -> TelegramResult<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> TelegramResult<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> TelegramResult<Message> {
        self.call(
            "sendMessage",
            &SendMessage {
                chat_id,
                text,
                reply_markup: markup,
            },
        )
        .await
    }

    /// Upload `photo` from disk with `caption`.
    pub async fn send_photo(
        &self,
        chat_id: &str,
        photo: &Path,
        caption: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> TelegramResult<Message> {
        let bytes = tokio::fs::read(photo).await?;
        let file_name = photo
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", Part::bytes(bytes).file_name(file_name));
        if let Some(markup) = markup {
            form = form.text("reply_markup", serde_json::to_string(markup)?);
        }

        let response = self
            .http
            .post(self.url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        Self::handle_response("sendPhoto", response).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: &str,
        message_id: i64,
        text: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> TelegramResult<()> {
        let request = EditMessage {
            chat_id,
            message_id,
            text: Some(text),
            caption: None,
            reply_markup: markup,
        };
        let _: serde_json::Value = self.call("editMessageText", &request).await?;
        Ok(())
    }

    pub async fn edit_message_caption(
        &self,
        chat_id: &str,
        message_id: i64,
        caption: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> TelegramResult<()> {
        let request = EditMessage {
            chat_id,
            message_id,
            text: None,
            caption: Some(caption),
            reply_markup: markup,
        };
        let _: serde_json::Value = self.call("editMessageCaption", &request).await?;
        Ok(())
    }

    pub async fn delete_message(&self, chat_id: &str, message_id: i64) -> TelegramResult<()> {
        let _: bool = self
            .call("deleteMessage", &DeleteMessage { chat_id, message_id })
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(
        &self,
        query_id: &str,
        text: Option<&str>,
    ) -> TelegramResult<()> {
        let request = AnswerCallbackQuery {
            callback_query_id: query_id,
            text,
        };
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &B,
    ) -> TelegramResult<T> {
        let response = self.http.post(self.url(method)).json(body).send().await?;
        Self::handle_response(method, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        method: &'static str,
        response: reqwest::Response,
    ) -> TelegramResult<T> {
        let status = response.status();
        let body: ApiResponse<T> = response.json().await?;

        if body.ok {
            body.result.ok_or(TelegramError::EmptyResult(method))
        } else {
            Err(TelegramError::Api {
                code: body.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: body.description.unwrap_or_default(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_data_round_trip() {
        let markup = InlineKeyboardMarkup::claim("Claim", "kettle");
        let data = &markup.inline_keyboard[0][0].callback_data;
        assert_eq!(data, "gift kettle");
        assert_eq!(parse_claim_data(data), Some("kettle"));
    }

    #[test]
    fn test_parse_claim_data_rejects_other_payloads() {
        assert_eq!(parse_claim_data("gift "), None);
        assert_eq!(parse_claim_data("vote 3"), None);
        // Only the literal prefix is stripped, never a character set.
        assert_eq!(parse_claim_data("gift tiger"), Some("tiger"));
    }

    #[test]
    fn test_display_name() {
        let mut user = User {
            id: 1,
            first_name: "Ada".to_string(),
            last_name: Some("Lovelace".to_string()),
        };
        assert_eq!(user.display_name(), "Ada Lovelace");

        user.last_name = None;
        assert_eq!(user.display_name(), "Ada");
    }

    #[test]
    fn test_api_error_classification() {
        let missing = TelegramError::Api {
            code: 400,
            description: "Bad Request: message to delete not found".to_string(),
        };
        assert!(missing.is_message_missing());
        assert!(!missing.is_not_modified());

        let unchanged = TelegramError::Api {
            code: 400,
            description: "Bad Request: message is not modified".to_string(),
        };
        assert!(unchanged.is_not_modified());

        let forbidden = TelegramError::Api {
            code: 403,
            description: "Forbidden: bot was blocked by the user".to_string(),
        };
        assert!(!forbidden.is_message_missing());
    }

    #[test]
    fn test_edit_request_omits_absent_fields() {
        let request = EditMessage {
            chat_id: "42",
            message_id: 7,
            text: None,
            caption: Some("done"),
            reply_markup: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "chat_id": "42", "message_id": 7, "caption": "done" })
        );
    }

    #[test]
    fn test_update_deserialization() {
        let raw = r#"{
            "update_id": 10,
            "callback_query": {
                "id": "abc",
                "from": {"id": 42, "first_name": "Ada", "is_bot": false},
                "data": "gift kettle"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let query = update.callback_query.unwrap();
        assert_eq!(query.from.id, 42);
        assert_eq!(query.data.as_deref(), Some("gift kettle"));
        assert!(update.message.is_none());
    }
}

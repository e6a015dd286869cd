//! Catalogue of the notifications this layer raises on its own.
//!
//! Titles are part of the dedupe key and of the reconnect clean-up rule
//! ([`CONNECTION_ERROR_TITLE`]), so they are fixed strings.

use std::time::Duration;

use crate::notification::{
    ActionHandler, NotificationAction, NotificationOptions, NotificationRequest,
};

/// Title of connection-lost errors. Cleared when the connection recovers.
pub const CONNECTION_ERROR_TITLE: &str = "Ошибка соединения";
/// Title of the expired-session error.
pub const AUTH_ERROR_TITLE: &str = "Ошибка авторизации";
/// Title of backend failures (close code 1011).
pub const SERVER_ERROR_TITLE: &str = "Ошибка сервера";
/// Title of errors without a more specific class.
pub const GENERIC_ERROR_TITLE: &str = "Ошибка";
/// Title shown when the connection recovers.
pub const RECONNECTED_TITLE: &str = "Соединение восстановлено";
/// Title shown when the transport stops retrying on its own.
pub const DISCONNECTED_TITLE: &str = "Соединение разорвано";
/// Title of successes reported through the notification handle.
pub const SUCCESS_TITLE: &str = "Успешно";
/// Title of informational notices reported through the notification handle.
pub const INFO_TITLE: &str = "Информация";
/// Title of the model-unavailable warning.
pub const MODEL_UNAVAILABLE_TITLE: &str = "Модель недоступна";

/// Label of the manual reconnect action.
pub const RECONNECT_LABEL: &str = "Переподключить";
/// Label of the login action on authentication errors.
pub const LOGIN_LABEL: &str = "Войти";

const RECONNECTED_DURATION: Duration = Duration::from_millis(3000);

/// Connection lost (state `failed` or close code 1006).
pub fn connection_lost(message: impl Into<String>) -> NotificationRequest {
    NotificationRequest::error(CONNECTION_ERROR_TITLE, message).with_options(
        NotificationOptions::default()
            .with_action(NotificationAction::primary(RECONNECT_LABEL, ActionHandler::Reconnect)),
    )
}

/// Expired session (close code 1008). Stays until the user acts.
pub fn auth_failed() -> NotificationRequest {
    NotificationRequest::error(AUTH_ERROR_TITLE, "Сессия истекла. Войдите в систему снова.")
        .with_options(
            NotificationOptions::persistent()
                .with_action(NotificationAction::primary(LOGIN_LABEL, ActionHandler::OpenLogin)),
        )
}

/// Backend failure (close code 1011).
pub fn server_error() -> NotificationRequest {
    NotificationRequest::error(SERVER_ERROR_TITLE, "Сервер временно недоступен. Попробуйте позже.")
}

/// Any other transport error.
pub fn generic_error(message: impl Into<String>) -> NotificationRequest {
    let message = message.into();
    let message = if message.trim().is_empty() {
        "Произошла непредвиденная ошибка".to_string()
    } else {
        message
    };
    NotificationRequest::error(GENERIC_ERROR_TITLE, message)
}

/// Connection recovered after a disruption.
pub fn reconnected() -> NotificationRequest {
    NotificationRequest::success(RECONNECTED_TITLE, "Подключение к серверу восстановлено")
        .with_options(NotificationOptions::default().with_duration(RECONNECTED_DURATION))
}

/// Transport stopped without retrying.
pub fn disconnected() -> NotificationRequest {
    NotificationRequest::warning(DISCONNECTED_TITLE, "Соединение с сервером закрыто").with_options(
        NotificationOptions::default()
            .with_action(NotificationAction::primary(RECONNECT_LABEL, ActionHandler::Reconnect)),
    )
}

/// A model requested by the user cannot serve requests right now.
pub fn model_unavailable(model: &str) -> NotificationRequest {
    NotificationRequest::warning(
        MODEL_UNAVAILABLE_TITLE,
        format!("Модель «{model}» временно недоступна. Попробуйте позже."),
    )
    .with_options(
        NotificationOptions::default()
            .with_action(NotificationAction::secondary("Повторить", ActionHandler::Retry)),
    )
}

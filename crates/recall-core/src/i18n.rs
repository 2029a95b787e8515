//! Localized texts for server error identifiers.
//!
//! The server answers failed requests with a short plain-text identifier.
//! Known identifiers are translated; everything else is shown verbatim.

/// Shown when the server returned an empty error body.
pub const UNKNOWN_ERROR: &str = "Неизвестная ошибка сервера";

const MESSAGES: &[(&str, &str)] = &[
    (
        "user answer status must be null",
        "Вы уже ответили на этот вопрос, если хотите ответить на вопрос повторно, то начните новый тест",
    ),
    (
        "test session is not active",
        "Этот тест устарел и закрыт, начните новый тест",
    ),
];

/// Exact-match lookup of a server error identifier.
pub fn lookup(key: &str) -> Option<&'static str> {
    MESSAGES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Turn a raw error body into the text shown to the user.
pub fn localize(body: &str) -> String {
    let key = body.trim();
    if key.is_empty() {
        return UNKNOWN_ERROR.to_string();
    }
    lookup(key).map(str::to_string).unwrap_or_else(|| key.to_string())
}

//! User agent strings sent with outgoing requests.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Browser and crawler identities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserAgent {
    #[default]
    Chrome,
    Webkit,
    Firefox,
    GoogleBot,
    YandexBot,
}

impl UserAgent {
    pub const ALL: [UserAgent; 5] = [
        UserAgent::Chrome,
        UserAgent::Webkit,
        UserAgent::Firefox,
        UserAgent::GoogleBot,
        UserAgent::YandexBot,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UserAgent::Chrome => "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/69.0.3497.100 Safari/537.36",
            UserAgent::Webkit => "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_4) AppleWebKit/605.1.15 (KHTML, like Gecko)",
            UserAgent::Firefox => "Mozilla/5.0 (Windows NT 5.1; rv:36.0) Gecko/20100101 Firefox/36.0",
            UserAgent::GoogleBot => "Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; Googlebot/2.1; +http://www.google.com/bot.html) Safari/537.36",
            UserAgent::YandexBot => "Mozilla/5.0 (compatible; YandexBot/3.0; +http://yandex.com/bots)",
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

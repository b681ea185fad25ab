use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Base URL scheme of a transport. [`Peer::url`] appends the `s` suffix
/// for secure peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Persistent connection (`ws` / `wss`).
    WebSocket,
    /// One-shot request (`http` / `https`).
    Http,
}

impl Scheme {
    /// Scheme token without the secure suffix.
    pub fn base(self) -> &'static str {
        match self {
            Scheme::WebSocket => "ws",
            Scheme::Http => "http",
        }
    }
}

/// A participant of the relay, identified by its broker and an id on that
/// broker.
///
/// The id is a decimal numeral by convention, but it is stored and compared
/// as text and never validated. Nothing about the broker is validated
/// either; a malformed value surfaces when a transport tries to use it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Peer {
    broker: String,
    id: String,
    secure: bool,
}

impl Peer {
    /// Creates a peer that is reached over the encrypted scheme variants.
    pub fn new(broker: impl Into<String>, id: impl Into<String>) -> Self {
        Self::with_secure(broker, id, true)
    }

    pub fn with_secure(broker: impl Into<String>, id: impl Into<String>, secure: bool) -> Self {
        Self {
            broker: broker.into(),
            id: id.into(),
            secure,
        }
    }

    /// Same peer, reached over plain `ws`/`http`.
    pub fn insecure(self) -> Self {
        Self {
            secure: false,
            ..self
        }
    }

    /// Network address of the relay broker.
    pub fn broker(&self) -> &str {
        &self.broker
    }

    /// Identifier of the peer on its broker, a decimal number as text.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Parses the `{broker}/{id}` form, splitting on the first `/`.
    ///
    /// Text without a `/` becomes a broker with an empty id. The secure flag
    /// is not part of the text form, so the result is always secure.
    pub fn parse(text: &str) -> Self {
        match text.split_once('/') {
            Some((broker, id)) => Self::new(broker, id),
            None => Self::new(text, ""),
        }
    }

    /// Builds `{scheme}[s]://{broker}/{id}[?{query}]`.
    ///
    /// `query` must already be encoded; it is appended verbatim.
    pub fn url(&self, scheme: Scheme, query: Option<&str>) -> String {
        let suffix = if self.secure { "s" } else { "" };
        let mut url = format!("{}{}://{}/{}", scheme.base(), suffix, self.broker, self.id);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.broker, self.id)
    }
}

impl FromStr for Peer {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for Peer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Peer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

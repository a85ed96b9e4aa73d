use std::fmt;
use std::str::FromStr;

/// Server used by the web client for personal chats (`<number>@c.us`).
pub const USER_SERVER: &str = "c.us";

/// Chat identifier as the web client understands it (`user@server`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Jid {
    pub user: String,
    pub server: String,
}

impl Jid {
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
        }
    }

    /// Personal chat for a phone number already in international digit form.
    pub fn user(number: impl Into<String>) -> Self {
        Self::new(number, USER_SERVER)
    }
}

impl FromStr for Jid {
    type Err = JidParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (user, server) = s.split_once('@').ok_or(JidParseError)?;
        if user.is_empty() || server.is_empty() || server.contains('@') {
            return Err(JidParseError);
        }
        Ok(Self::new(user, server))
    }
}

#[derive(Debug)]
pub struct JidParseError;

impl fmt::Display for JidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid JID format")
    }
}

impl std::error::Error for JidParseError {}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}

impl serde::Serialize for Jid {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Jid {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Jid::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_jid_display() {
        let j = Jid::user("6282227025335");
        assert_eq!(j.to_string(), "6282227025335@c.us");
        assert_eq!(j.server, USER_SERVER);
    }

    #[test]
    fn jid_parse() {
        let j: Jid = "120363025246125486@g.us".parse().unwrap();
        assert_eq!(j.user, "120363025246125486");
        assert_eq!(j.server, "g.us");
    }

    #[test]
    fn jid_parse_rejects_malformed() {
        assert!("no-server".parse::<Jid>().is_err());
        assert!("@c.us".parse::<Jid>().is_err());
        assert!("62812@".parse::<Jid>().is_err());
        assert!("a@b@c".parse::<Jid>().is_err());
    }

    #[test]
    fn jid_serializes_as_string() {
        let j = Jid::user("628123");
        assert_eq!(serde_json::to_string(&j).unwrap(), "\"628123@c.us\"");
        let back: Jid = serde_json::from_str("\"628123@c.us\"").unwrap();
        assert_eq!(back, j);
    }
}

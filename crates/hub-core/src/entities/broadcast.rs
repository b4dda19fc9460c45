//! Broadcast message - the unit of fanout

use std::fmt;
use std::sync::Arc;

/// Opaque message payload shared by every outbound queue it is fanned out to
pub type Payload = Arc<str>;

/// What a broadcast message represents
///
/// Only [`MessageKind::General`] carries sender content; the other kinds are
/// system notices about session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Content sent by a session
    General,
    /// A session joined the hub
    Online,
    /// A session left (peer close or connection failure)
    Offline,
    /// A session was disconnected for inactivity
    ForcedOffline,
}

impl MessageKind {
    /// Whether messages of this kind are appended to the history store
    #[must_use]
    pub const fn is_persisted(self) -> bool {
        match self {
            Self::General => true,
            Self::Online | Self::Offline | Self::ForcedOffline => false,
        }
    }

    /// Stable lowercase name, used in log fields
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Online => "online",
            Self::Offline => "offline",
            Self::ForcedOffline => "forced_offline",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable message submitted to the hub for fanout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastMessage {
    kind: MessageKind,
    payload: Payload,
}

impl BroadcastMessage {
    /// Create a message of the given kind
    pub fn new(kind: MessageKind, payload: impl Into<Payload>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Sender content
    pub fn general(payload: impl Into<Payload>) -> Self {
        Self::new(MessageKind::General, payload)
    }

    /// Join notice
    pub fn online(payload: impl Into<Payload>) -> Self {
        Self::new(MessageKind::Online, payload)
    }

    /// Leave notice
    pub fn offline(payload: impl Into<Payload>) -> Self {
        Self::new(MessageKind::Offline, payload)
    }

    /// Inactivity disconnect notice
    pub fn forced_offline(payload: impl Into<Payload>) -> Self {
        Self::new(MessageKind::ForcedOffline, payload)
    }

    /// Get the message kind
    #[inline]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Get the payload
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Consume the message, returning its payload
    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_general_is_persisted() {
        assert!(MessageKind::General.is_persisted());
        assert!(!MessageKind::Online.is_persisted());
        assert!(!MessageKind::Offline.is_persisted());
        assert!(!MessageKind::ForcedOffline.is_persisted());
    }

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(BroadcastMessage::general("a").kind(), MessageKind::General);
        assert_eq!(BroadcastMessage::online("a").kind(), MessageKind::Online);
        assert_eq!(BroadcastMessage::offline("a").kind(), MessageKind::Offline);
        assert_eq!(
            BroadcastMessage::forced_offline("a").kind(),
            MessageKind::ForcedOffline
        );
    }

    #[test]
    fn test_payload_is_shared() {
        let message = BroadcastMessage::general("hello");
        let a = message.payload().clone();
        let b = message.into_payload();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(&*a, "hello");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MessageKind::ForcedOffline.to_string(), "forced_offline");
    }
}

//! Wire text conventions
//!
//! Everything the hub puts on the wire is plain text: stamped chat lines and
//! lifecycle notices. Coalesced frames join lines with `\n`.

mod format;

pub use format::{
    forced_offline_notice, normalize, offline_notice, online_notice, stamp, FRAME_SEPARATOR,
};

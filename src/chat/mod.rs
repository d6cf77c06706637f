//! Real-time chat for book discussion rooms.
//!
//! One room per book. The presence tracker is the process-local source of
//! truth for who is in which room; the room registry fans saved messages
//! out over per-book broadcast channels; `ws` is the WebSocket event loop
//! tying them together.

pub mod db;
pub mod presence;
pub mod rooms;
pub mod ws;

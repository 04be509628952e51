// src/sources/mod.rs
pub mod historical;
pub mod live_stt;

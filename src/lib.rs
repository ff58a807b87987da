pub mod api;
pub mod captcha;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod net;
pub mod pipeline;
pub mod retry;
pub mod scheduler;
pub mod terminal;
pub mod wallet;

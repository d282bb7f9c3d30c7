pub mod auth;
pub mod bank;
pub mod config;
pub mod dashboard;
pub mod handler;
pub mod heartbeat;
pub mod http;
pub mod leaderboard;
pub mod model;
pub mod persistence;
pub mod reconcile;
pub mod server;
pub mod session_timer;

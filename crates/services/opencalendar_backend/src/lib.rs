// --- File: crates/services/opencalendar_backend/src/lib.rs ---

pub mod app; // Router assembly and middleware

pub use app::build_app;

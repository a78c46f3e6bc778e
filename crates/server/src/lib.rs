//! HTTP surface and PostgREST backend for the event linter rule tester.

pub mod api;
pub mod router;
pub mod state;
pub mod supabase;

pub use router::build_router;
pub use state::AppState;
pub use supabase::SupabaseStore;

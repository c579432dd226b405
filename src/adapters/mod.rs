//! Persistence backends for `PosStore`.

pub mod kv;
pub mod supabase;

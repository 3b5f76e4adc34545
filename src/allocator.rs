//! Global allocator.
//!
//! Carrier files are held in memory from selection until the request settles, so
//! the binary swaps the system allocator for mimalloc.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

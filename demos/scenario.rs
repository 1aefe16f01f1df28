//! Runs the classic allocator walkthrough: three allocations with both
//! strategies, two releases and a leak check on the block left behind.
//!
//! Set `RUST_LOG=arenalloc=debug` to watch splits and merges as they happen.

use arenalloc::{MemAlloc, Strategy};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let mut heap = MemAlloc::new();

    let a = heap.allocate(200, Strategy::FirstFit);
    let b = heap.allocate(300, Strategy::BestFit);
    let c = heap.allocate(100, Strategy::FirstFit);

    println!();
    print!("{}", heap.dump());

    heap.release(b.ok());
    heap.release(a.ok());

    println!();
    print!("{}", heap.dump());

    // `c` is never released on purpose.
    if let Err(err) = &c {
        eprintln!("{err}");
    }
    print!("{}", heap.scan_leaks());
}

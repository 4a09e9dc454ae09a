//! Cache statistics collection and reporting.
//!
//! This module tracks the running counters of one cache environment. It provides:
//! 1. **Outcomes:** Accesses, hits, misses, and how each miss was resolved (fill, eviction, skip).
//! 2. **Operations:** Read and write counts, and write-backs of dirty victims.
//! 3. **Policy Faults:** Out-of-range eviction actions recovered by the engine.
//!
//! `accesses == hits + misses` holds after every step.

/// Running statistics for one episode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Accesses consumed from the trace.
    pub accesses: u64,
    /// Accesses satisfied by a resident block.
    pub hits: u64,
    /// Accesses not satisfied by a resident block (fills, evictions, and skips).
    pub misses: u64,
    /// Misses placed into a free slot.
    pub fills: u64,
    /// Misses that displaced a resident block.
    pub evictions: u64,
    /// Misses dropped without admission.
    pub skips: u64,
    /// Evicted blocks that were dirty.
    pub writebacks: u64,
    /// Eviction actions outside `[0, cache_size)`.
    pub invalid_actions: u64,
    /// Read accesses.
    pub reads: u64,
    /// Write accesses.
    pub writes: u64,
}

/// Section names for selective stats output.
///
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "misses", "operations"];

impl CacheStats {
    /// Fraction of accesses that missed; `0.0` before any access.
    pub fn miss_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.misses as f64 / self.accesses as f64
        }
    }

    /// Fraction of accesses that hit; `0.0` before any access.
    pub fn hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses as f64
        }
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of `"summary"`, `"misses"`, or
    /// `"operations"`. Pass an empty slice to print all sections.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let total = self.accesses.max(1) as f64;
        let misses = self.misses.max(1) as f64;

        println!("\n==========================================================");
        println!("CACHE SIMULATION STATISTICS");
        println!("==========================================================");
        if want("summary") {
            println!("accesses                 {}", self.accesses);
            println!("hits                     {}", self.hits);
            println!("misses                   {}", self.misses);
            println!("miss_rate                {:.4}", self.miss_rate());
            println!("----------------------------------------------------------");
        }
        if want("misses") {
            println!("MISS RESOLUTION");
            println!(
                "  miss.fill              {} ({:.2}%)",
                self.fills,
                (self.fills as f64 / misses) * 100.0
            );
            println!(
                "  miss.evict             {} ({:.2}%)",
                self.evictions,
                (self.evictions as f64 / misses) * 100.0
            );
            println!(
                "  miss.skip              {} ({:.2}%)",
                self.skips,
                (self.skips as f64 / misses) * 100.0
            );
            println!("  evict.writeback        {}", self.writebacks);
            println!("  action.out_of_range    {}", self.invalid_actions);
            println!("----------------------------------------------------------");
        }
        if want("operations") {
            println!("OPERATIONS");
            println!(
                "  op.read                {} ({:.2}%)",
                self.reads,
                (self.reads as f64 / total) * 100.0
            );
            println!(
                "  op.write               {} ({:.2}%)",
                self.writes,
                (self.writes as f64 / total) * 100.0
            );
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}

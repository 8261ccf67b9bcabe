use crate::hierarchy::Operation;
use crate::io::TraceEntry;

/// Generates a deterministic pseudo-random trace
///
/// Addresses are drawn from `0..span`, so a small span produces plenty of reuse and a large one
/// mostly compulsory misses. Roughly half the references are loads, the rest split between stores
/// and modifies
///
/// # Arguments
///
/// * `entries`: The number of trace entries
/// * `span`: The exclusive upper bound on addresses, at least 1
/// * `seed`: Any value, equal seeds give equal traces
///
/// returns: Vec<TraceEntry>
pub fn generate_trace(entries: usize, span: u64, seed: u64) -> Vec<TraceEntry> {
    // xorshift64 gets stuck at zero
    let mut state = seed | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    (0..entries)
        .map(|_| {
            let operation = match next() % 4 {
                0 | 1 => Operation::Load,
                2 => Operation::Store,
                _ => Operation::Modify,
            };
            TraceEntry {
                operation,
                address: next() % span.max(1),
                size: 1 << (next() % 4),
            }
        })
        .collect()
}

/// Renders entries in the trace file format, one per line
pub fn render_trace(entries: &[TraceEntry]) -> String {
    let mut out = String::with_capacity(entries.len() * 16);
    for entry in entries {
        out.push_str(&format!(" {} {:x},{}\n", entry.operation, entry.address, entry.size));
    }
    out
}

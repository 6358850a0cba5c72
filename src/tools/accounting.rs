//! Per-turn tool call accounting.
//!
//! Counters reset at the start of every user turn. The loop consults
//! [`CallAccountant::is_tool_limit_reached`] and
//! [`CallAccountant::is_total_limit_reached`] before each dispatch; the
//! accountant itself never refuses an increment. Refused dispatches still
//! cost one unit of the total so a turn stays bounded.

use crate::agent::ToolUsage;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Fallback per-tool limit for tools without an override.
pub const DEFAULT_TOOL_CALL_LIMIT: u32 = 10;
/// Default cap on all tool calls within one turn.
pub const DEFAULT_TOTAL_CALL_LIMIT: u32 = 50;

/// Configured limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallLimits {
    pub default_tool_limit: u32,
    pub total_limit: u32,
    pub overrides: HashMap<String, u32>,
}

impl Default for CallLimits {
    fn default() -> Self {
        Self {
            default_tool_limit: DEFAULT_TOOL_CALL_LIMIT,
            total_limit: DEFAULT_TOTAL_CALL_LIMIT,
            overrides: HashMap::new(),
        }
    }
}

impl CallLimits {
    /// Effective limit for one tool.
    pub fn limit_for(&self, tool: &str) -> u32 {
        self.overrides
            .get(tool)
            .copied()
            .unwrap_or(self.default_tool_limit)
    }
}

/// Point-in-time copy of the counters, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    /// `(tool, count, limit)` sorted by tool name.
    pub tools: Vec<(String, u32, u32)>,
    pub total: u32,
    pub total_limit: u32,
}

#[derive(Debug, Default)]
struct AccountingState {
    counts: HashMap<String, u32>,
    total: u32,
    limits: CallLimits,
}

/// Mutex-guarded call counters, safe to read from a UI thread mid-turn.
#[derive(Debug, Default)]
pub struct CallAccountant {
    state: Mutex<AccountingState>,
}

impl CallAccountant {
    pub fn new(limits: CallLimits) -> Self {
        Self {
            state: Mutex::new(AccountingState {
                limits,
                ..AccountingState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AccountingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Zero every per-tool count and the total.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.counts.clear();
        state.total = 0;
    }

    /// Bump the tool and total counters, returning `(new_count, limit)`.
    pub fn increment(&self, tool: &str) -> (u32, u32) {
        let usage = self.record(tool);
        (usage.count, usage.limit)
    }

    /// Like [`increment`](Self::increment), but also reports the total and
    /// total limit read under the same lock.
    pub fn record(&self, tool: &str) -> ToolUsage {
        let mut state = self.lock();
        state.total = state.total.saturating_add(1);
        let limit = state.limits.limit_for(tool);
        let count = state.counts.entry(tool.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        let count = *count;
        ToolUsage {
            count,
            limit,
            total: state.total,
            total_limit: state.limits.total_limit,
        }
    }

    /// Charge a refused dispatch (unknown tool or per-tool limit) to the
    /// total only. Returns the new total.
    pub fn charge_refused(&self) -> u32 {
        let mut state = self.lock();
        state.total = state.total.saturating_add(1);
        state.total
    }

    pub fn is_tool_limit_reached(&self, tool: &str) -> bool {
        let state = self.lock();
        let count = state.counts.get(tool).copied().unwrap_or(0);
        count >= state.limits.limit_for(tool)
    }

    pub fn is_total_limit_reached(&self) -> bool {
        let state = self.lock();
        state.total >= state.limits.total_limit
    }

    pub fn tool_count(&self, tool: &str) -> u32 {
        self.lock().counts.get(tool).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.lock().total
    }

    pub fn limit_for(&self, tool: &str) -> u32 {
        self.lock().limits.limit_for(tool)
    }

    pub fn total_limit(&self) -> u32 {
        self.lock().limits.total_limit
    }

    pub fn set_default_tool_limit(&self, limit: u32) {
        self.lock().limits.default_tool_limit = limit;
    }

    pub fn set_total_limit(&self, limit: u32) {
        self.lock().limits.total_limit = limit;
    }

    pub fn set_tool_limit(&self, tool: &str, limit: u32) {
        self.lock().limits.overrides.insert(tool.to_string(), limit);
    }

    /// Replace all per-tool overrides.
    pub fn set_tool_limits(&self, overrides: HashMap<String, u32>) {
        self.lock().limits.overrides = overrides;
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let state = self.lock();
        let mut tools: Vec<(String, u32, u32)> = state
            .counts
            .iter()
            .map(|(name, count)| (name.clone(), *count, state.limits.limit_for(name)))
            .collect();
        tools.sort_by(|a, b| a.0.cmp(&b.0));
        UsageSnapshot {
            tools,
            total: state.total,
            total_limit: state.limits.total_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn increment_tracks_tool_and_total() {
        let accountant = CallAccountant::default();
        for n in 1..=4 {
            let (count, limit) = accountant.increment("t");
            assert_eq!(count, n);
            assert_eq!(limit, DEFAULT_TOOL_CALL_LIMIT);
        }
        assert_eq!(accountant.tool_count("t"), 4);
        assert_eq!(accountant.total(), 4);
    }

    #[test]
    fn record_reports_consistent_usage() {
        let accountant = CallAccountant::new(CallLimits {
            total_limit: 9,
            ..CallLimits::default()
        });
        accountant.set_tool_limit("t", 4);
        accountant.increment("other");
        let usage = accountant.record("t");
        assert_eq!(
            usage,
            ToolUsage {
                count: 1,
                limit: 4,
                total: 2,
                total_limit: 9
            }
        );
    }

    #[test]
    fn refused_dispatch_counts_toward_total_only() {
        let accountant = CallAccountant::new(CallLimits {
            total_limit: 2,
            ..CallLimits::default()
        });
        assert_eq!(accountant.charge_refused(), 1);
        assert_eq!(accountant.tool_count("nope"), 0);
        assert!(accountant.snapshot().tools.is_empty());
        assert_eq!(accountant.charge_refused(), 2);
        assert!(accountant.is_total_limit_reached());
    }

    #[test]
    fn tool_limit_is_reached_exactly_at_limit() {
        let accountant = CallAccountant::default();
        accountant.set_tool_limit("t", 3);
        for _ in 0..2 {
            accountant.increment("t");
            assert!(!accountant.is_tool_limit_reached("t"));
        }
        accountant.increment("t");
        assert!(accountant.is_tool_limit_reached("t"));
        assert!(!accountant.is_tool_limit_reached("other"));
    }

    #[test]
    fn total_limit_spans_all_tools() {
        let accountant = CallAccountant::new(CallLimits {
            total_limit: 3,
            ..CallLimits::default()
        });
        accountant.increment("a");
        accountant.increment("b");
        assert!(!accountant.is_total_limit_reached());
        accountant.increment("c");
        assert!(accountant.is_total_limit_reached());
    }

    #[test]
    fn reset_zeroes_everything() {
        let accountant = CallAccountant::default();
        accountant.increment("a");
        accountant.increment("a");
        accountant.increment("b");
        accountant.reset();
        assert_eq!(accountant.total(), 0);
        assert_eq!(accountant.tool_count("a"), 0);
        assert!(accountant.snapshot().tools.is_empty());
    }

    #[test]
    fn overrides_take_precedence_over_default() {
        let accountant = CallAccountant::default();
        accountant.set_default_tool_limit(2);
        accountant.set_tool_limits(HashMap::from([("http_request".to_string(), 7)]));
        assert_eq!(accountant.limit_for("http_request"), 7);
        assert_eq!(accountant.limit_for("read_file"), 2);
    }

    #[test]
    fn zero_limit_blocks_before_first_call() {
        let accountant = CallAccountant::default();
        accountant.set_tool_limit("t", 0);
        accountant.set_total_limit(0);
        assert!(accountant.is_tool_limit_reached("t"));
        assert!(accountant.is_total_limit_reached());
    }

    #[test]
    fn snapshot_is_sorted_and_carries_limits() {
        let accountant = CallAccountant::default();
        accountant.set_tool_limit("b", 4);
        accountant.increment("b");
        accountant.increment("a");
        let snap = accountant.snapshot();
        assert_eq!(
            snap.tools,
            vec![
                ("a".to_string(), 1, DEFAULT_TOOL_CALL_LIMIT),
                ("b".to_string(), 1, 4)
            ]
        );
        assert_eq!(snap.total, 2);
        assert_eq!(snap.total_limit, DEFAULT_TOTAL_CALL_LIMIT);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let accountant = Arc::new(CallAccountant::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let accountant = accountant.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        accountant.increment("t");
                        let _ = accountant.snapshot();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(accountant.tool_count("t"), 800);
        assert_eq!(accountant.total(), 800);
    }
}

//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep them `false` by default so
//! release builds remain quiet.

pub struct DebugFlags {
    /// Emit per-candidate swing acceptance/rejection while extracting swings.
    pub print_swing_candidates: bool,
    /// Emit cluster membership details during zone clustering.
    pub print_cluster_membership: bool,
    /// Emit per-band drop reasons inside the zone filter.
    pub print_filter_decisions: bool,
    /// Emit per-term scoring contributions for every band.
    pub print_score_components: bool,
    /// Emit flip state-machine transitions (breach/retest).
    pub print_flip_transitions: bool,
}

pub const DEBUG_FLAGS: DebugFlags = DebugFlags {
    print_swing_candidates: false,
    print_cluster_membership: false,
    print_filter_decisions: false,
    print_score_components: false,
    print_flip_transitions: false,
};

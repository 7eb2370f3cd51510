/// Synchronisation policy between concurrently armed AIs and AOs
/// (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// AI and AO are armed independently; no shared restart.
    #[default]
    NoSync,
    /// Starting an AO always re-arms every AI sharing its trigger group.
    StartSync,
    /// The AI's sample clock also drives the AO.
    AISync,
    /// A hardware counter drives both; a gain change mid-run is rejected
    /// rather than silently re-armed (spec.md §9 open question — resolved
    /// in `AcquisitionEngine::write`'s doc comment).
    CounterSync,
}

//! Player-facing calculator form state and its reducer.
//!
//! The form holds one or more module entries ("slots") per kind and the
//! selected application mode. Every user action goes through [`reduce`],
//! which takes the current state by reference and returns a new one, so no
//! state is ever mutated in place by a caller.
//!
//! # Form Rules
//!
//! 1. Each kind starts with one empty slot (amount 0, tier 1)
//! 2. At most 9 modules may be installed across all slots
//! 3. Amounts are clamped to what is left under that cap
//! 4. Tiers are clamped to 1–40
//! 5. A kind always keeps at least one slot
//! 6. Stats are recomputed after every accepted action, once any slot
//!    holds a module
//!
//! ```
//! use modcalc_logic::form::{reduce, Action, AppState};
//! use modcalc_logic::modules::ModuleKind;
//!
//! let state = AppState::default();
//! let id = state.slots(ModuleKind::Speed)[0].id;
//! let state = reduce(&state, Action::SetAmount { kind: ModuleKind::Speed, id, value: 2 }).unwrap();
//! assert_eq!(state.results().unwrap().processing_speed, 3.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::limits;
use crate::modules::{ApplicationMode, EntriesByKind, ModuleEntry, ModuleKind};
use crate::stats::{stats_from_counts, Stats, TierOneCounts};

/// Stable identifier of a slot within a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single editable row of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSlot {
    pub id: SlotId,
    pub entry: ModuleEntry,
}

/// A user action on the form.
///
/// `SetAmount` and `SetTier` carry the raw signed value the player typed;
/// the reducer clamps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    AddEntry(ModuleKind),
    RemoveEntry { kind: ModuleKind, id: SlotId },
    SetAmount { kind: ModuleKind, id: SlotId, value: i64 },
    SetTier { kind: ModuleKind, id: SlotId, value: i64 },
    SetMode(ApplicationMode),
}

/// Rejected form action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("no {kind} slot with id {id}")]
    UnknownEntry { kind: ModuleKind, id: SlotId },
    #[error("module cap reached: {total} of {max} modules installed", max = limits::MAX_TOTAL_MODULES)]
    ModuleCapReached { total: u32 },
    #[error("cannot remove the last {0} slot")]
    LastEntry(ModuleKind),
    #[error("no slot ids left")]
    SlotIdsExhausted,
}

/// Loaded form state that breaks the form rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidState {
    #[error("{0} has no slots")]
    MissingKind(ModuleKind),
    #[error("slot id {0} is used more than once")]
    DuplicateSlotId(SlotId),
    #[error("next id {next_id} does not exceed slot id {id}")]
    StaleNextId { next_id: u32, id: SlotId },
    #[error("{total} modules installed, more than {max}", max = limits::MAX_TOTAL_MODULES)]
    OverCap { total: u32 },
}

/// Complete form state. Immutable from the outside; change it with [`reduce`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAppState")]
pub struct AppState {
    modules: BTreeMap<ModuleKind, Vec<ModuleSlot>>,
    mode: ApplicationMode,
    results: Option<Stats>,
    next_id: u32,
}

/// Unchecked shape of a serialized [`AppState`].
#[derive(Deserialize)]
struct RawAppState {
    modules: BTreeMap<ModuleKind, Vec<ModuleSlot>>,
    mode: ApplicationMode,
    results: Option<Stats>,
    next_id: u32,
}

impl TryFrom<RawAppState> for AppState {
    type Error = InvalidState;

    fn try_from(raw: RawAppState) -> Result<Self, Self::Error> {
        let state = AppState {
            modules: raw.modules,
            mode: raw.mode,
            results: raw.results,
            next_id: raw.next_id,
        };

        if let Some(kind) = ModuleKind::ALL
            .into_iter()
            .find(|&kind| state.slots(kind).is_empty())
        {
            return Err(InvalidState::MissingKind(kind));
        }

        let mut seen = std::collections::BTreeSet::new();
        for (_, slot) in state.iter_slots() {
            if !seen.insert(slot.id) {
                return Err(InvalidState::DuplicateSlotId(slot.id));
            }
            if slot.id.0 >= state.next_id {
                return Err(InvalidState::StaleNextId {
                    next_id: state.next_id,
                    id: slot.id,
                });
            }
        }

        let total = state.total_amount();
        if total > limits::MAX_TOTAL_MODULES {
            return Err(InvalidState::OverCap { total });
        }
        Ok(state)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ApplicationMode::default())
    }
}

impl AppState {
    /// Fresh form: one empty slot per kind, no results yet.
    pub fn new(mode: ApplicationMode) -> Self {
        let mut modules = BTreeMap::new();
        for (i, kind) in ModuleKind::ALL.into_iter().enumerate() {
            modules.insert(
                kind,
                vec![ModuleSlot {
                    id: SlotId(i as u32),
                    entry: ModuleEntry::default(),
                }],
            );
        }
        Self {
            modules,
            mode,
            results: None,
            next_id: ModuleKind::ALL.len() as u32,
        }
    }

    pub fn mode(&self) -> ApplicationMode {
        self.mode
    }

    /// Last computed stats, `None` until some slot holds a module.
    pub fn results(&self) -> Option<&Stats> {
        self.results.as_ref()
    }

    /// Slots of one kind, in insertion order.
    pub fn slots(&self, kind: ModuleKind) -> &[ModuleSlot] {
        self.modules.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every `(kind, slot)` pair in kind order.
    pub fn iter_slots(&self) -> impl Iterator<Item = (ModuleKind, &ModuleSlot)> + '_ {
        self.modules
            .iter()
            .flat_map(|(kind, slots)| slots.iter().map(move |slot| (*kind, slot)))
    }

    /// Slot entries grouped by kind, as the aggregator takes them.
    pub fn entries_by_kind(&self) -> EntriesByKind {
        self.modules
            .iter()
            .map(|(kind, slots)| (*kind, slots.iter().map(|s| s.entry).collect()))
            .collect()
    }

    pub fn tier_one_counts(&self) -> TierOneCounts {
        TierOneCounts::from_entries(self.iter_slots().map(|(kind, slot)| (kind, slot.entry)))
    }

    /// Modules installed across every slot.
    pub fn total_amount(&self) -> u32 {
        self.iter_slots()
            .fold(0u32, |sum, (_, slot)| sum.saturating_add(slot.entry.amount))
    }

    /// Modules that may still be placed, ignoring the `(kind, id)` slot
    /// `excluding`.
    pub fn remaining_capacity(&self, excluding: Option<(ModuleKind, SlotId)>) -> u32 {
        let others = self
            .iter_slots()
            .filter(|(kind, slot)| Some((*kind, slot.id)) != excluding)
            .fold(0u32, |sum, (_, slot)| sum.saturating_add(slot.entry.amount));
        limits::MAX_TOTAL_MODULES.saturating_sub(others)
    }

    /// Whether another slot may be added.
    pub fn can_add(&self) -> bool {
        self.total_amount() < limits::MAX_TOTAL_MODULES
    }

    /// Whether any slot holds at least one module.
    pub fn has_modules(&self) -> bool {
        self.iter_slots().any(|(_, slot)| slot.entry.amount > 0)
    }

    /// Stats for the current slots, computed regardless of whether the form
    /// has been populated.
    pub fn current_stats(&self) -> Stats {
        stats_from_counts(&self.tier_one_counts(), self.mode)
    }

    fn slot_mut(&mut self, kind: ModuleKind, id: SlotId) -> Result<&mut ModuleSlot, FormError> {
        self.modules
            .get_mut(&kind)
            .and_then(|slots| slots.iter_mut().find(|s| s.id == id))
            .ok_or(FormError::UnknownEntry { kind, id })
    }

    /// Refresh `results` after a mutation. An unpopulated form keeps
    /// whatever was shown before.
    fn recompute(mut self) -> Self {
        if self.has_modules() {
            let stats = self.current_stats();
            log::debug!("recomputed stats: {stats:?}");
            self.results = Some(stats);
        }
        self
    }
}

/// Apply one action, returning the new state. The input state is never
/// modified; on error the caller simply keeps it.
pub fn reduce(state: &AppState, action: Action) -> Result<AppState, FormError> {
    let mut next = state.clone();
    if let Err(err) = apply(&mut next, action) {
        log::warn!("rejected {action:?}: {err}");
        return Err(err);
    }
    log::debug!("applied {action:?}");
    Ok(next.recompute())
}

fn apply(state: &mut AppState, action: Action) -> Result<(), FormError> {
    match action {
        Action::AddEntry(kind) => {
            let total = state.total_amount();
            if total >= limits::MAX_TOTAL_MODULES {
                return Err(FormError::ModuleCapReached { total });
            }
            let id = SlotId(state.next_id);
            state.next_id = state
                .next_id
                .checked_add(1)
                .ok_or(FormError::SlotIdsExhausted)?;
            state.modules.entry(kind).or_default().push(ModuleSlot {
                id,
                entry: ModuleEntry::default(),
            });
        }
        Action::RemoveEntry { kind, id } => {
            let slots = state
                .modules
                .get_mut(&kind)
                .ok_or(FormError::UnknownEntry { kind, id })?;
            let index = slots
                .iter()
                .position(|s| s.id == id)
                .ok_or(FormError::UnknownEntry { kind, id })?;
            if slots.len() <= 1 {
                return Err(FormError::LastEntry(kind));
            }
            slots.remove(index);
        }
        Action::SetAmount { kind, id, value } => {
            let cap = state.remaining_capacity(Some((kind, id)));
            let slot = state.slot_mut(kind, id)?;
            slot.entry.amount = clamp_to_u32(value, 0, cap);
        }
        Action::SetTier { kind, id, value } => {
            let slot = state.slot_mut(kind, id)?;
            slot.entry.tier = clamp_to_u32(value, limits::MIN_TIER, limits::MAX_TIER);
        }
        Action::SetMode(mode) => {
            state.mode = mode;
        }
    }
    Ok(())
}

fn clamp_to_u32(value: i64, min: u32, max: u32) -> u32 {
    value.clamp(i64::from(min), i64::from(max.max(min))) as u32
}

/// Read a typed form field the lenient way a web form does: leading
/// whitespace and an optional sign, then as many digits as are present.
/// Anything without a leading number reads as zero.
pub fn parse_field(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add(i64::from(d - b'0'))
        });
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_id(state: &AppState, kind: ModuleKind) -> SlotId {
        state.slots(kind)[0].id
    }

    fn set_amount(state: &AppState, kind: ModuleKind, value: i64) -> AppState {
        let id = first_id(state, kind);
        reduce(state, Action::SetAmount { kind, id, value }).unwrap()
    }

    #[test]
    fn fresh_form_has_one_empty_slot_per_kind() {
        let state = AppState::default();
        for kind in ModuleKind::ALL {
            let slots = state.slots(kind);
            assert_eq!(slots.len(), 1);
            assert_eq!(slots[0].entry, ModuleEntry::new(0, 1));
        }
        assert_eq!(state.mode(), ApplicationMode::Machines);
        assert!(state.results().is_none());
        assert!(state.can_add());
    }

    #[test]
    fn slot_ids_are_unique() {
        let mut state = AppState::default();
        for kind in ModuleKind::ALL {
            state = reduce(&state, Action::AddEntry(kind)).unwrap();
        }
        let mut ids: Vec<_> = state.iter_slots().map(|(_, s)| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn setting_amount_computes_results() {
        let state = set_amount(&AppState::default(), ModuleKind::Speed, 2);
        let stats = state.results().unwrap();
        assert_eq!(stats.processing_speed, 3.0);
        assert_eq!(stats.energy_consumption, 5.0);
        assert_eq!(stats.product_waste, 80.0);
    }

    #[test]
    fn reducer_leaves_input_untouched() {
        let before = AppState::default();
        let snapshot = before.clone();
        let _after = set_amount(&before, ModuleKind::Efficiency, 4);
        assert_eq!(before, snapshot);
    }

    #[test]
    fn amount_clamps_to_remaining_capacity() {
        let state = set_amount(&AppState::default(), ModuleKind::Speed, 6);
        let state = set_amount(&state, ModuleKind::Productivity, 20);
        assert_eq!(state.slots(ModuleKind::Productivity)[0].entry.amount, 3);
        assert_eq!(state.total_amount(), 9);
        assert!(!state.can_add());
    }

    #[test]
    fn amount_clamps_negative_to_zero() {
        let state = set_amount(&AppState::default(), ModuleKind::Speed, -5);
        assert_eq!(state.slots(ModuleKind::Speed)[0].entry.amount, 0);
    }

    #[test]
    fn slot_can_be_lowered_when_cap_is_full() {
        let state = set_amount(&AppState::default(), ModuleKind::Speed, 9);
        let state = set_amount(&state, ModuleKind::Speed, 4);
        assert_eq!(state.total_amount(), 4);
        assert_eq!(state.remaining_capacity(None), 5);
    }

    #[test]
    fn tier_clamps_into_range() {
        let state = AppState::default();
        let id = first_id(&state, ModuleKind::Speed);
        let high = reduce(&state, Action::SetTier { kind: ModuleKind::Speed, id, value: 99 }).unwrap();
        assert_eq!(high.slots(ModuleKind::Speed)[0].entry.tier, 40);
        let low = reduce(&state, Action::SetTier { kind: ModuleKind::Speed, id, value: 0 }).unwrap();
        assert_eq!(low.slots(ModuleKind::Speed)[0].entry.tier, 1);
    }

    #[test]
    fn add_rejected_at_cap() {
        let state = set_amount(&AppState::default(), ModuleKind::Efficiency, 9);
        assert_eq!(
            reduce(&state, Action::AddEntry(ModuleKind::Speed)),
            Err(FormError::ModuleCapReached { total: 9 })
        );
    }

    #[test]
    fn last_slot_cannot_be_removed() {
        let state = AppState::default();
        let id = first_id(&state, ModuleKind::Productivity);
        assert_eq!(
            reduce(&state, Action::RemoveEntry { kind: ModuleKind::Productivity, id }),
            Err(FormError::LastEntry(ModuleKind::Productivity))
        );
    }

    #[test]
    fn added_slot_can_be_removed() {
        let state = reduce(&AppState::default(), Action::AddEntry(ModuleKind::Speed)).unwrap();
        let added = state.slots(ModuleKind::Speed)[1].id;
        let state = reduce(&state, Action::RemoveEntry { kind: ModuleKind::Speed, id: added }).unwrap();
        assert_eq!(state.slots(ModuleKind::Speed).len(), 1);
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let state = AppState::default();
        // Slot #0 belongs to speed, not efficiency.
        let err = reduce(
            &state,
            Action::SetAmount { kind: ModuleKind::Efficiency, id: SlotId(0), value: 1 },
        )
        .unwrap_err();
        assert_eq!(
            err,
            FormError::UnknownEntry { kind: ModuleKind::Efficiency, id: SlotId(0) }
        );
    }

    #[test]
    fn mode_switch_recomputes() {
        let state = set_amount(&AppState::default(), ModuleKind::Speed, 1);
        let state = reduce(&state, Action::SetMode(ApplicationMode::Generators)).unwrap();
        let stats = state.results().unwrap();
        assert_eq!(stats.energy_consumption, 0.0);
        assert!((stats.energy_production - 0.9).abs() < 1e-9);
    }

    #[test]
    fn unpopulated_form_keeps_previous_results() {
        let populated = set_amount(&AppState::default(), ModuleKind::Speed, 2);
        let shown = *populated.results().unwrap();
        let cleared = set_amount(&populated, ModuleKind::Speed, 0);
        assert_eq!(cleared.results(), Some(&shown));
        assert_eq!(cleared.current_stats().processing_speed, 1.0);
    }

    #[test]
    fn capacity_excludes_only_the_edited_slot() {
        let state = set_amount(&AppState::default(), ModuleKind::Speed, 4);
        let state = set_amount(&state, ModuleKind::Efficiency, 3);
        let speed = first_id(&state, ModuleKind::Speed);
        assert_eq!(state.remaining_capacity(Some((ModuleKind::Speed, speed))), 6);
        // Same id under another kind matches no slot, so nothing is excluded.
        assert_eq!(state.remaining_capacity(Some((ModuleKind::Efficiency, speed))), 2);
    }

    fn state_json(speed_id: u32, efficiency_id: u32, amount: u32, next_id: u32) -> String {
        format!(
            r#"{{
                "modules": {{
                    "speed": [{{"id": {speed_id}, "entry": {{"amount": {amount}, "tier": 1}}}}],
                    "efficiency": [{{"id": {efficiency_id}, "entry": {{"amount": 0, "tier": 1}}}}],
                    "productivity": [{{"id": 2, "entry": {{"amount": 0, "tier": 1}}}}]
                }},
                "mode": "machines",
                "results": null,
                "next_id": {next_id}
            }}"#
        )
    }

    #[test]
    fn loaded_state_round_trips() {
        let state: AppState = serde_json::from_str(&state_json(0, 1, 3, 3)).unwrap();
        assert_eq!(state.total_amount(), 3);
        let again: AppState =
            serde_json::from_str(&serde_json::to_string(&state).unwrap()).unwrap();
        assert_eq!(again.slots(ModuleKind::Speed), state.slots(ModuleKind::Speed));
    }

    #[test]
    fn loaded_state_with_shared_slot_id_is_rejected() {
        let err = serde_json::from_str::<AppState>(&state_json(0, 0, 0, 3)).unwrap_err();
        assert!(err.to_string().contains("slot id #0 is used more than once"), "{err}");
    }

    #[test]
    fn loaded_state_with_stale_next_id_is_rejected() {
        let err = serde_json::from_str::<AppState>(&state_json(0, 1, 0, 2)).unwrap_err();
        assert!(err.to_string().contains("next id 2"), "{err}");
    }

    #[test]
    fn loaded_state_over_cap_is_rejected() {
        let err = serde_json::from_str::<AppState>(&state_json(0, 1, 12, 3)).unwrap_err();
        assert!(err.to_string().contains("12 modules installed"), "{err}");
    }

    #[test]
    fn loaded_state_missing_a_kind_is_rejected() {
        let json = r#"{
            "modules": {
                "speed": [{"id": 0, "entry": {"amount": 0, "tier": 1}}],
                "efficiency": [{"id": 1, "entry": {"amount": 0, "tier": 1}}]
            },
            "mode": "machines",
            "results": null,
            "next_id": 3
        }"#;
        let err = serde_json::from_str::<AppState>(json).unwrap_err();
        assert!(err.to_string().contains("productivity has no slots"), "{err}");
    }

    #[test]
    fn cap_holds_for_every_loaded_state() {
        let state: AppState = serde_json::from_str(&state_json(0, 1, 0, 3)).unwrap();
        let state = reduce(
            &state,
            Action::SetAmount { kind: ModuleKind::Speed, id: SlotId(0), value: 9 },
        )
        .unwrap();
        let state = reduce(
            &state,
            Action::SetAmount { kind: ModuleKind::Efficiency, id: SlotId(1), value: 9 },
        )
        .unwrap();
        assert_eq!(state.total_amount(), limits::MAX_TOTAL_MODULES);
        assert_eq!(state.slots(ModuleKind::Efficiency)[0].entry.amount, 0);
    }

    #[test]
    fn slot_ids_run_out_without_panicking() {
        let mut state = AppState::default();
        state.next_id = u32::MAX;
        assert_eq!(
            reduce(&state, Action::AddEntry(ModuleKind::Speed)),
            Err(FormError::SlotIdsExhausted)
        );
        assert_eq!(state.slots(ModuleKind::Speed).len(), 1);
    }

    #[test]
    fn parse_field_is_lenient() {
        assert_eq!(parse_field("7"), 7);
        assert_eq!(parse_field("  12abc"), 12);
        assert_eq!(parse_field("-3"), -3);
        assert_eq!(parse_field("+4"), 4);
        assert_eq!(parse_field("abc"), 0);
        assert_eq!(parse_field(""), 0);
        assert_eq!(parse_field("-"), 0);
        assert_eq!(parse_field("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn errors_render_readably() {
        assert_eq!(
            FormError::ModuleCapReached { total: 9 }.to_string(),
            "module cap reached: 9 of 9 modules installed"
        );
        assert_eq!(
            FormError::LastEntry(ModuleKind::Speed).to_string(),
            "cannot remove the last speed slot"
        );
    }
}

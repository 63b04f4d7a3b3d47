//! The pairwise merge routine and its divergence rule.

use metapop_core::{is_missing, RegionEngine, ScalarAttr, SyncError, VariantAttr};

/// Counters describing one synchronization pass over a region pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Slots whose home-side value was filled from the away side.
    pub copied_to_home: u64,
    /// Slots whose away-side value was filled or overwritten from the
    /// home side (includes tie-break overwrites).
    pub copied_to_away: u64,
}

impl SyncStats {
    /// Total slots changed by the pass, both directions.
    pub fn total(&self) -> u64 {
        self.copied_to_home + self.copied_to_away
    }

    fn absorb(&mut self, other: SyncStats) {
        self.copied_to_home += other.copied_to_home;
        self.copied_to_away += other.copied_to_away;
    }
}

/// Synchronize one traveling cohort between its home and visited region.
///
/// `home_ids[k]` and `away_ids[k]` identify the same person: their local
/// slot in `home` and their visitor slot in `away`. For every scalar
/// attribute, and independently for every variant index of every
/// per-variant attribute, diverging slots are resolved as follows:
///
/// - home missing, away present: away's value is copied to home;
/// - away missing, home present: home's value is copied to away;
/// - both present but unequal: home's value overwrites away's.
///
/// The home-wins tie-break is load-bearing: it is how state discovered
/// at home (e.g. becoming infected overnight) propagates outward to the
/// visited region's duplicate record.
///
/// # Errors
///
/// Fails before writing anything if the id lists differ in length, if
/// any id does not fit an attribute buffer, or if the engines disagree
/// on variant count. A partial merge would corrupt epidemic state with
/// no visible symptom, so every failure here is loud.
pub fn synchronize_pair(
    home: &mut dyn RegionEngine,
    away: &mut dyn RegionEngine,
    home_ids: &[u32],
    away_ids: &[u32],
) -> Result<SyncStats, SyncError> {
    if home_ids.len() != away_ids.len() {
        return Err(SyncError::LengthMismatch {
            home: home_ids.len(),
            away: away_ids.len(),
        });
    }
    if home.n_variants() != away.n_variants() {
        return Err(SyncError::VariantCountMismatch {
            home: home.n_variants(),
            away: away.n_variants(),
        });
    }
    check_bounds(home_ids, home.n_agents(), "home agent space")?;
    check_bounds(away_ids, away.n_agents(), "away agent space")?;

    let mut stats = SyncStats::default();
    for attr in ScalarAttr::ALL {
        let merged = merge_buffers(
            home.scalar_mut(attr),
            away.scalar_mut(attr),
            home_ids,
            away_ids,
            attr.name(),
        )?;
        stats.absorb(merged);
    }
    for attr in VariantAttr::ALL {
        for variant in 0..home.n_variants() {
            let merged = merge_buffers(
                home.variant_mut(attr, variant),
                away.variant_mut(attr, variant),
                home_ids,
                away_ids,
                attr.name(),
            )?;
            stats.absorb(merged);
        }
    }
    Ok(stats)
}

fn check_bounds(ids: &[u32], len: usize, buffer: &'static str) -> Result<(), SyncError> {
    for &id in ids {
        if id as usize >= len {
            return Err(SyncError::SlotOutOfRange {
                buffer,
                slot: id as usize,
                len,
            });
        }
    }
    Ok(())
}

/// Merge one attribute buffer pair along the paired id lists.
fn merge_buffers(
    home: &mut [f64],
    away: &mut [f64],
    home_ids: &[u32],
    away_ids: &[u32],
    buffer: &'static str,
) -> Result<SyncStats, SyncError> {
    // Buffers can legitimately be shorter than the agent space only if
    // an engine misreports; re-check against these buffers so a short
    // buffer fails loudly instead of panicking mid-merge.
    check_bounds(home_ids, home.len(), buffer)?;
    check_bounds(away_ids, away.len(), buffer)?;

    let mut stats = SyncStats::default();
    for (&h, &a) in home_ids.iter().zip(away_ids.iter()) {
        let (h, a) = (h as usize, a as usize);
        let hv = home[h];
        let av = away[a];
        if is_missing(hv) && is_missing(av) {
            continue;
        }
        if is_missing(hv) {
            home[h] = av;
            stats.copied_to_home += 1;
        } else if is_missing(av) || hv != av {
            away[a] = hv;
            stats.copied_to_away += 1;
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metapop_core::MISSING;
    use metapop_test_utils::ScriptedEngine;
    use proptest::prelude::*;

    fn engine(n_agents: usize, n_variants: usize) -> ScriptedEngine {
        ScriptedEngine::new("test", n_agents, n_variants, 10)
    }

    #[test]
    fn divergence_resolution_concrete_case() {
        // The canonical case: p1=[NaN,5,7], p2=[3,NaN,9] must converge
        // to [3,5,7] on both sides (slot 3 resolves to home's value).
        let mut home = engine(3, 1);
        let mut away = engine(3, 1);
        home.scalar_mut(ScalarAttr::DateExposed)
            .copy_from_slice(&[MISSING, 5.0, 7.0]);
        away.scalar_mut(ScalarAttr::DateExposed)
            .copy_from_slice(&[3.0, MISSING, 9.0]);

        let stats = synchronize_pair(&mut home, &mut away, &[0, 1, 2], &[0, 1, 2]).unwrap();

        assert_eq!(home.scalar(ScalarAttr::DateExposed), &[3.0, 5.0, 7.0]);
        assert_eq!(away.scalar(ScalarAttr::DateExposed), &[3.0, 5.0, 7.0]);
        assert_eq!(stats.copied_to_home, 1);
        assert_eq!(stats.copied_to_away, 2);
    }

    #[test]
    fn both_missing_stays_missing() {
        let mut home = engine(2, 1);
        let mut away = engine(2, 1);
        let stats = synchronize_pair(&mut home, &mut away, &[0, 1], &[0, 1]).unwrap();
        assert_eq!(stats.total(), 0);
        assert!(is_missing(home.scalar(ScalarAttr::DateExposed)[0]));
        assert!(is_missing(away.scalar(ScalarAttr::DateExposed)[0]));
    }

    #[test]
    fn sync_is_idempotent() {
        let mut home = engine(4, 2);
        let mut away = engine(4, 2);
        home.scalar_mut(ScalarAttr::Infectious)
            .copy_from_slice(&[1.0, MISSING, 0.0, 1.0]);
        away.scalar_mut(ScalarAttr::Infectious)
            .copy_from_slice(&[MISSING, 1.0, 1.0, MISSING]);
        home.variant_mut(VariantAttr::SusImm, 1)[2] = 0.8;

        let first = synchronize_pair(&mut home, &mut away, &[0, 1, 2, 3], &[0, 1, 2, 3]).unwrap();
        assert!(first.total() > 0);
        let second = synchronize_pair(&mut home, &mut away, &[0, 1, 2, 3], &[0, 1, 2, 3]).unwrap();
        assert_eq!(second, SyncStats::default());
    }

    #[test]
    fn variant_buffers_merge_independently() {
        let mut home = engine(2, 3);
        let mut away = engine(2, 3);
        home.variant_mut(VariantAttr::ExposedByVariant, 0)[0] = 1.0;
        away.variant_mut(VariantAttr::ExposedByVariant, 2)[1] = 1.0;

        synchronize_pair(&mut home, &mut away, &[0, 1], &[1, 0]).unwrap();

        // home slot 0 pairs with away slot 1.
        assert_eq!(away.variant(VariantAttr::ExposedByVariant, 0)[1], 1.0);
        assert_eq!(home.variant(VariantAttr::ExposedByVariant, 2)[0], 1.0);
        // Variant 1 untouched on both sides.
        assert!(is_missing(home.variant(VariantAttr::ExposedByVariant, 1)[0]));
        assert!(is_missing(away.variant(VariantAttr::ExposedByVariant, 1)[1]));
    }

    #[test]
    fn paired_slots_need_not_share_positions() {
        // Visitor slots live at the top of the away region's space.
        let mut home = engine(10, 1);
        let mut away = engine(20, 1);
        home.scalar_mut(ScalarAttr::Infections)[3] = 2.0;

        synchronize_pair(&mut home, &mut away, &[3], &[17]).unwrap();
        assert_eq!(away.scalar(ScalarAttr::Infections)[17], 2.0);
        assert!(is_missing(away.scalar(ScalarAttr::Infections)[3]));
    }

    #[test]
    fn length_mismatch_fails_before_writing() {
        let mut home = engine(3, 1);
        let mut away = engine(3, 1);
        home.scalar_mut(ScalarAttr::Dead)[0] = 1.0;
        let err = synchronize_pair(&mut home, &mut away, &[0, 1], &[0]).unwrap_err();
        assert_eq!(err, SyncError::LengthMismatch { home: 2, away: 1 });
        assert!(is_missing(away.scalar(ScalarAttr::Dead)[0]));
    }

    #[test]
    fn out_of_range_slot_fails_loudly() {
        let mut home = engine(3, 1);
        let mut away = engine(3, 1);
        let err = synchronize_pair(&mut home, &mut away, &[0, 5], &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            SyncError::SlotOutOfRange {
                buffer: "home agent space",
                slot: 5,
                ..
            }
        ));
        assert!(format!("{err}").contains("home agent space"));

        let err = synchronize_pair(&mut home, &mut away, &[0, 1], &[0, 7]).unwrap_err();
        assert!(matches!(
            err,
            SyncError::SlotOutOfRange {
                buffer: "away agent space",
                slot: 7,
                ..
            }
        ));
    }

    #[test]
    fn variant_count_mismatch_fails_loudly() {
        let mut home = engine(3, 2);
        let mut away = engine(3, 3);
        let err = synchronize_pair(&mut home, &mut away, &[0], &[0]).unwrap_err();
        assert_eq!(err, SyncError::VariantCountMismatch { home: 2, away: 3 });
    }

    // ── Properties ───────────────────────────────────────────

    fn arb_side() -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(
            prop_oneof![Just(MISSING), (0u32..50).prop_map(f64::from)],
            8,
        )
    }

    proptest! {
        #[test]
        fn sides_agree_after_sync(home_vals in arb_side(), away_vals in arb_side()) {
            let mut home = engine(8, 1);
            let mut away = engine(8, 1);
            home.scalar_mut(ScalarAttr::DateRecovered).copy_from_slice(&home_vals);
            away.scalar_mut(ScalarAttr::DateRecovered).copy_from_slice(&away_vals);
            let ids: Vec<u32> = (0..8).collect();

            synchronize_pair(&mut home, &mut away, &ids, &ids).unwrap();

            for slot in 0..8 {
                let h = home.scalar(ScalarAttr::DateRecovered)[slot];
                let a = away.scalar(ScalarAttr::DateRecovered)[slot];
                prop_assert!(
                    (is_missing(h) && is_missing(a)) || h == a,
                    "slot {} diverged: home {}, away {}", slot, h, a
                );
            }
        }

        #[test]
        fn second_pass_is_a_no_op(home_vals in arb_side(), away_vals in arb_side()) {
            let mut home = engine(8, 1);
            let mut away = engine(8, 1);
            home.scalar_mut(ScalarAttr::DateExposed).copy_from_slice(&home_vals);
            away.scalar_mut(ScalarAttr::DateExposed).copy_from_slice(&away_vals);
            let ids: Vec<u32> = (0..8).collect();

            synchronize_pair(&mut home, &mut away, &ids, &ids).unwrap();
            let second = synchronize_pair(&mut home, &mut away, &ids, &ids).unwrap();
            prop_assert_eq!(second, SyncStats::default());
        }

        #[test]
        fn present_home_values_never_change(home_vals in arb_side(), away_vals in arb_side()) {
            let mut home = engine(8, 1);
            let mut away = engine(8, 1);
            home.scalar_mut(ScalarAttr::PeakNab).copy_from_slice(&home_vals);
            away.scalar_mut(ScalarAttr::PeakNab).copy_from_slice(&away_vals);
            let ids: Vec<u32> = (0..8).collect();

            synchronize_pair(&mut home, &mut away, &ids, &ids).unwrap();

            for slot in 0..8 {
                if !is_missing(home_vals[slot]) {
                    prop_assert_eq!(home.scalar(ScalarAttr::PeakNab)[slot], home_vals[slot]);
                }
            }
        }
    }
}

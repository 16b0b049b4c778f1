//! Field-level fold of collector fragments and real-time patches into a
//! [`Snapshot`].
//!
//! Every assignment is a plain overwrite, so folding the same fragment twice
//! leaves the snapshot as it was after the first fold.

use tla_protocol::{
    Account, AccountFragment, Fragment, LocationFragment, LocationState, PageContext,
    RealtimePatch, Snapshot,
};

use crate::collector::CollectorRole;

/// Fold one fragment according to the precedence rules of `role`.
///
/// Returns the number of locations the fragment touched.
pub fn fold_fragment(snapshot: &mut Snapshot, role: CollectorRole, fragment: &Fragment) -> usize {
    match role {
        // An overview that listed no locations did not load; trust none of it.
        CollectorRole::Comprehensive if fragment.locations.is_empty() => 0,
        CollectorRole::Comprehensive | CollectorRole::CurrentPage => {
            for loc in &fragment.locations {
                upsert_location(snapshot, loc);
            }
            if let Some(account) = &fragment.account {
                overwrite_account(&mut snapshot.account, account);
            }
            if let Some(active) = &fragment.active_location {
                snapshot.active_location = Some(active.clone());
            }
            if let Some(hero) = fragment.hero {
                snapshot.hero = Some(hero);
            }
            fragment.locations.len()
        }
        CollectorRole::Background => {
            let mut added = 0;
            for loc in &fragment.locations {
                if !snapshot.locations.contains_key(&loc.id) {
                    snapshot.locations.insert(loc.id.clone(), new_location(loc));
                    added += 1;
                }
            }
            if let Some(account) = &fragment.account {
                fill_account(&mut snapshot.account, account);
            }
            if snapshot.active_location.is_none() {
                snapshot.active_location = fragment.active_location.clone();
            }
            if snapshot.hero.is_none() {
                snapshot.hero = fragment.hero;
            }
            added
        }
    }
}

fn upsert_location(snapshot: &mut Snapshot, frag: &LocationFragment) {
    match snapshot.locations.get_mut(&frag.id) {
        Some(existing) => overwrite_location(existing, frag),
        None => {
            snapshot
                .locations
                .insert(frag.id.clone(), new_location(frag));
        }
    }
}

fn new_location(frag: &LocationFragment) -> LocationState {
    let mut loc = LocationState::new(frag.id.clone(), frag.id.clone());
    overwrite_location(&mut loc, frag);
    loc
}

fn overwrite_location(loc: &mut LocationState, frag: &LocationFragment) {
    if let Some(name) = &frag.name {
        loc.name = name.clone();
    }
    if let Some(coords) = frag.coordinates {
        loc.coordinates = Some(coords);
    }
    if let Some(resources) = frag.resources {
        loc.resources = Some(resources);
    }
    if let Some(production) = frag.production {
        loc.production = production;
    }
    if let Some(capacity) = frag.capacity {
        loc.capacity = Some(capacity);
    }
    if let Some(queue) = &frag.build_queue {
        loc.build_queue = queue.clone();
    }
}

fn overwrite_account(account: &mut Account, frag: &AccountFragment) {
    if let Some(tribe) = &frag.tribe {
        account.tribe = tribe.clone();
    }
    if let Some(population) = frag.population {
        account.population = population;
    }
    if let Some(culture) = frag.culture {
        account.culture = culture;
    }
}

/// Background sources only fill account fields still at their defaults.
fn fill_account(account: &mut Account, frag: &AccountFragment) {
    let defaults = Account::default();
    if account.tribe == defaults.tribe {
        if let Some(tribe) = &frag.tribe {
            account.tribe = tribe.clone();
        }
    }
    if account.population == defaults.population {
        if let Some(population) = frag.population {
            account.population = population;
        }
    }
    if account.culture == defaults.culture {
        if let Some(culture) = frag.culture {
            account.culture = culture;
        }
    }
}

/// Overwrite the patched fields of a known location. Unknown ids are ignored.
pub fn apply_patch(snapshot: &mut Snapshot, patch: &RealtimePatch) -> bool {
    let Some(loc) = snapshot.locations.get_mut(&patch.location_id) else {
        return false;
    };
    if let Some(resources) = patch.resources {
        loc.resources = Some(resources);
    }
    if let Some(production) = patch.production {
        loc.production = production;
    }
    true
}

/// Map an observation target (typically the page URL) to a context tag.
pub fn classify_page(target: &str) -> PageContext {
    if target.contains("dorf1.php") {
        PageContext::Resources
    } else if target.contains("dorf2.php") {
        PageContext::Buildings
    } else if target.contains("dorf3.php") {
        PageContext::Overview
    } else if target.contains("build.php") {
        if target.contains("gid=16") {
            PageContext::RallyPoint
        } else {
            PageContext::Building
        }
    } else if target.contains("spieler.php") {
        PageContext::Profile
    } else if target.contains("statistiken.php") {
        PageContext::Statistics
    } else {
        PageContext::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tla_protocol::{Capacity, Culture, HeroStats, Production, ResourceSet};
    use tla_topics::{PATCH_PRODUCTION, PATCH_RESOURCES};

    fn stock(n: u64) -> ResourceSet {
        ResourceSet {
            wood: n,
            clay: n,
            iron: n,
            crop: n,
        }
    }

    fn located(id: &str, n: u64) -> LocationFragment {
        LocationFragment {
            resources: Some(stock(n)),
            ..LocationFragment::new(id)
        }
    }

    #[test]
    fn empty_overview_leaves_snapshot_untouched() {
        let mut snap = Snapshot::default();
        fold_fragment(
            &mut snap,
            CollectorRole::Comprehensive,
            &Fragment {
                locations: vec![located("a", 5)],
                account: Some(AccountFragment {
                    tribe: Some("Gauls".into()),
                    population: Some(300),
                    culture: None,
                }),
                active_location: Some("a".into()),
                hero: None,
            },
        );
        let before = snap.clone();

        let touched = fold_fragment(
            &mut snap,
            CollectorRole::Comprehensive,
            &Fragment {
                locations: Vec::new(),
                account: Some(AccountFragment {
                    tribe: Some("Romans".into()),
                    population: Some(0),
                    culture: None,
                }),
                active_location: Some("elsewhere".into()),
                hero: Some(HeroStats {
                    health_pct: Some(10),
                    ..HeroStats::default()
                }),
            },
        );

        assert_eq!(touched, 0);
        assert_eq!(snap, before);
    }

    #[test]
    fn current_page_without_locations_still_updates_hero() {
        let mut snap = Snapshot::default();
        fold_fragment(
            &mut snap,
            CollectorRole::CurrentPage,
            &Fragment {
                hero: Some(HeroStats {
                    health_pct: Some(45),
                    ..HeroStats::default()
                }),
                ..Fragment::default()
            },
        );
        assert_eq!(snap.hero.and_then(|h| h.health_pct), Some(45));
    }

    #[test]
    fn folding_twice_equals_folding_once() {
        let frag = Fragment {
            locations: vec![
                LocationFragment {
                    name: Some("North".into()),
                    production: Some(Production {
                        wood: 10,
                        clay: 10,
                        iron: 10,
                        crop: -3,
                    }),
                    capacity: Some(Capacity {
                        warehouse_max: 800,
                        granary_max: 800,
                    }),
                    ..located("a", 5)
                },
                located("b", 7),
            ],
            account: Some(AccountFragment {
                tribe: Some("Teutons".into()),
                population: Some(120),
                culture: None,
            }),
            active_location: Some("a".into()),
            hero: None,
        };

        let mut once = Snapshot::default();
        fold_fragment(&mut once, CollectorRole::Comprehensive, &frag);
        let mut twice = once.clone();
        fold_fragment(&mut twice, CollectorRole::Comprehensive, &frag);

        assert_eq!(once, twice);
        assert_eq!(once.locations.len(), 2);
        assert_eq!(once.account.tribe, "Teutons");
    }

    #[test]
    fn current_page_overwrites_but_keeps_other_locations() {
        let mut snap = Snapshot::default();
        let overview = Fragment {
            locations: vec![located("a", 100), located("b", 200)],
            ..Fragment::default()
        };
        let current = Fragment {
            locations: vec![located("a", 999)],
            ..Fragment::default()
        };

        fold_fragment(&mut snap, CollectorRole::Comprehensive, &overview);
        fold_fragment(&mut snap, CollectorRole::CurrentPage, &current);

        assert_eq!(snap.locations["a"].resources, Some(stock(999)));
        assert_eq!(snap.locations["b"].resources, Some(stock(200)));
    }

    #[test]
    fn partial_overwrite_keeps_unsupplied_fields() {
        let mut snap = Snapshot::default();
        let full = Fragment {
            locations: vec![LocationFragment {
                name: Some("Home".into()),
                capacity: Some(Capacity {
                    warehouse_max: 1200,
                    granary_max: 900,
                }),
                ..located("a", 1)
            }],
            ..Fragment::default()
        };
        fold_fragment(&mut snap, CollectorRole::Comprehensive, &full);
        fold_fragment(
            &mut snap,
            CollectorRole::CurrentPage,
            &Fragment {
                locations: vec![located("a", 2)],
                ..Fragment::default()
            },
        );

        let loc = &snap.locations["a"];
        assert_eq!(loc.name, "Home");
        assert_eq!(loc.capacity.map(|c| c.warehouse_max), Some(1200));
        assert_eq!(loc.resources, Some(stock(2)));
    }

    #[test]
    fn background_only_adds_unknown_locations() {
        let mut snap = Snapshot::default();
        fold_fragment(
            &mut snap,
            CollectorRole::CurrentPage,
            &Fragment {
                locations: vec![located("a", 50)],
                hero: Some(HeroStats {
                    health_pct: Some(80),
                    ..HeroStats::default()
                }),
                ..Fragment::default()
            },
        );
        let added = fold_fragment(
            &mut snap,
            CollectorRole::Background,
            &Fragment {
                locations: vec![located("a", 1), located("z", 1)],
                hero: Some(HeroStats {
                    health_pct: Some(5),
                    ..HeroStats::default()
                }),
                ..Fragment::default()
            },
        );

        assert_eq!(added, 1);
        assert_eq!(snap.locations["a"].resources, Some(stock(50)));
        assert_eq!(snap.locations["z"].resources, Some(stock(1)));
        assert_eq!(snap.hero.unwrap().health_pct, Some(80));
    }

    #[test]
    fn background_fills_only_default_account_fields() {
        let mut snap = Snapshot::default();
        snap.account.tribe = "Gauls".into();
        fold_fragment(
            &mut snap,
            CollectorRole::Background,
            &Fragment {
                account: Some(AccountFragment {
                    tribe: Some("Romans".into()),
                    population: Some(340),
                    culture: Some(Culture {
                        current: 10,
                        required: 2000,
                        daily: 40,
                    }),
                }),
                ..Fragment::default()
            },
        );
        assert_eq!(snap.account.tribe, "Gauls");
        assert_eq!(snap.account.population, 340);
        assert_eq!(snap.account.culture.daily, 40);
    }

    #[test]
    fn patch_overwrites_known_location_only() {
        let mut snap = Snapshot::default();
        snap.locations
            .insert("a".into(), LocationState::new("a", "A"));

        let patch = RealtimePatch {
            location_id: "a".into(),
            resources: Some(stock(42)),
            production: None,
            kind: PATCH_RESOURCES.into(),
        };
        assert!(apply_patch(&mut snap, &patch));
        assert_eq!(snap.locations["a"].resources, Some(stock(42)));

        let before = snap.clone();
        let stray = RealtimePatch {
            location_id: "ghost".into(),
            ..patch
        };
        assert!(!apply_patch(&mut snap, &stray));
        assert_eq!(snap, before);
    }

    #[test]
    fn production_patch_leaves_stock_alone() {
        let mut snap = Snapshot::default();
        let mut loc = LocationState::new("a", "A");
        loc.resources = Some(stock(7));
        snap.locations.insert("a".into(), loc);

        let rates = Production {
            wood: 1,
            clay: 2,
            iron: 3,
            crop: -4,
        };
        assert!(apply_patch(
            &mut snap,
            &RealtimePatch {
                location_id: "a".into(),
                resources: None,
                production: Some(rates),
                kind: PATCH_PRODUCTION.into(),
            }
        ));
        assert_eq!(snap.locations["a"].production, rates);
        assert_eq!(snap.locations["a"].resources, Some(stock(7)));
    }

    #[test]
    fn classifies_known_pages() {
        let base = "https://ts1.example.travian.com/";
        assert_eq!(
            classify_page(&format!("{base}dorf1.php")),
            PageContext::Resources
        );
        assert_eq!(
            classify_page(&format!("{base}dorf2.php?newdid=3")),
            PageContext::Buildings
        );
        assert_eq!(
            classify_page(&format!("{base}dorf3.php")),
            PageContext::Overview
        );
        assert_eq!(
            classify_page(&format!("{base}build.php?id=39&gid=16")),
            PageContext::RallyPoint
        );
        assert_eq!(
            classify_page(&format!("{base}build.php?id=26")),
            PageContext::Building
        );
        assert_eq!(
            classify_page(&format!("{base}spieler.php")),
            PageContext::Profile
        );
        assert_eq!(
            classify_page(&format!("{base}statistiken.php")),
            PageContext::Statistics
        );
        assert_eq!(
            classify_page(&format!("{base}karte.php")),
            PageContext::Unknown
        );
        assert_eq!(classify_page(""), PageContext::Unknown);
    }
}

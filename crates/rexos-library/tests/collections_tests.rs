//! Integration tests for the collection overlay

use rexos_config::CollectionsConfig;
use rexos_library::collections::LAST_PLAYED_MAX;
use rexos_library::{
    Catalog, CollectionEvent, CollectionManager, EditSession, FilterQuery, FilterType, Game,
    GameDatabase, GameId, GameMetadata, GameStore, LibraryError, MembershipStore, RomScanner,
    SystemLibrary, ThemeFolders, ToggleOutcome,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const GAMES: &[(&str, &str, &str)] = &[
    ("snes", "smetroid.sfc", "Super Metroid"),
    ("snes", "chrono.sfc", "Chrono Trigger"),
    ("snes", "contra.sfc", "Contra III"),
    ("gba", "awars.gba", "Advance Wars"),
    ("gba", "fusion.gba", "Metroid Fusion"),
    ("retropie", "wifi.sh", "Wi-Fi"),
];

/// Home directory with a collections folder, plus a hand-built store
struct CollectionsTestEnv {
    #[allow(dead_code)]
    temp_dir: TempDir,
    home: PathBuf,
}

impl CollectionsTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let home = temp_dir.path().join("home");
        fs::create_dir_all(&home).unwrap();
        Self { temp_dir, home }
    }

    fn rom_path(&self, system: &str, file: &str) -> String {
        self.home
            .join("roms")
            .join(system)
            .join(file)
            .to_string_lossy()
            .to_string()
    }

    fn collections_dir(&self) -> PathBuf {
        MembershipStore::default_dir(&self.home)
    }

    fn store(&self) -> GameStore {
        let roms = self.home.join("roms");
        let mut store = GameStore::new();
        store.add_system(SystemLibrary::new("snes", roms.join("snes")).with_full_name("Super Nintendo"));
        store.add_system(SystemLibrary::new("gba", roms.join("gba")).with_full_name("Game Boy Advance"));
        store.add_system(
            SystemLibrary::new("retropie", roms.join("retropie"))
                .with_full_name("RetroPie")
                .non_game(),
        );
        for (system, file, name) in GAMES {
            store.insert(Game::new(self.rom_path(system, file), *system, *name));
        }
        store
    }

    fn manager(&self, config: CollectionsConfig, themes: &[&str]) -> CollectionManager {
        let membership = MembershipStore::new(self.collections_dir(), &self.home).unwrap();
        CollectionManager::new(
            config,
            ThemeFolders::from_folders(themes.iter().copied()),
            membership,
        )
    }

    fn loaded(&self, config: CollectionsConfig, themes: &[&str], store: &GameStore) -> CollectionManager {
        let mut manager = self.manager(config, themes);
        manager.load_collection_systems(store).unwrap();
        manager
    }
}

fn id_of(store: &GameStore, env: &CollectionsTestEnv, system: &str, file: &str) -> GameId {
    store.find_by_path(&env.rom_path(system, file)).unwrap()
}

fn paths(manager: &CollectionManager, store: &GameStore, name: &str) -> Vec<String> {
    manager
        .get(name)
        .unwrap()
        .games()
        .iter()
        .map(|id| store.get(*id).unwrap().path.clone())
        .collect()
}

fn favorites_in_store(store: &GameStore) -> BTreeSet<GameId> {
    store.iter().filter(|(_, g)| g.favorite).map(|(id, _)| id).collect()
}

#[test]
fn test_empty_directory_yields_automatic_collections() {
    let env = CollectionsTestEnv::new();
    let store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);

    assert!(env.collections_dir().is_dir());
    assert_eq!(manager.auto_names(), vec!["all", "favorites", "recent"]);
    assert!(manager.custom_names().is_empty());
    assert_eq!(
        manager.display_list(),
        &[
            Catalog::System("snes".to_string()),
            Catalog::System("gba".to_string()),
            Catalog::System("retropie".to_string()),
            Catalog::Collection("favorites".to_string()),
            Catalog::Collection("recent".to_string()),
        ]
    );

    // not enabled, so not built until asked for
    assert!(!manager.get("all").unwrap().is_populated());
    let all = manager.collection("all", &store).unwrap();
    assert!(all.is_populated());
    assert_eq!(all.len(), 5);
}

#[test]
fn test_nothing_enabled_lists_systems_only() {
    let env = CollectionsTestEnv::new();
    let store = env.store();
    let config = CollectionsConfig {
        auto_enabled: String::new(),
        ..Default::default()
    };
    let manager = env.loaded(config, &[], &store);

    assert_eq!(manager.display_list().len(), 3);
    assert!(manager.auto_collections().all(|c| !c.is_populated()));
}

#[test]
fn test_custom_collection_persists_and_reloads() {
    let env = CollectionsTestEnv::new();
    let mut store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);

    let name = manager.create_custom_collection("Shmups", &store).unwrap();
    assert_eq!(name, "Shmups");
    assert!(manager.get("Shmups").unwrap().is_enabled());
    assert_eq!(manager.config().enabled_custom(), vec!["Shmups"]);

    manager.set_edit_mode("Shmups", &store).unwrap();
    let smetroid = id_of(&store, &env, "snes", "smetroid.sfc");
    let contra = id_of(&store, &env, "snes", "contra.sfc");
    manager.toggle_membership(&mut store, smetroid).unwrap();
    manager.toggle_membership(&mut store, contra).unwrap();
    assert!(manager.get("Shmups").unwrap().needs_persist());
    manager.exit_edit_mode(&store).unwrap();
    assert!(!manager.get("Shmups").unwrap().needs_persist());

    let file = env.collections_dir().join("custom-Shmups.cfg");
    let written = fs::read_to_string(&file).unwrap();
    assert_eq!(written, "~/roms/snes/contra.sfc\n~/roms/snes/smetroid.sfc\n");

    let mut contents = written;
    contents.push_str("~/roms/snes/missing.sfc\n");
    fs::write(&file, contents).unwrap();

    let config = manager.config().clone();
    let mut reloaded = env.loaded(config, &[], &store);
    assert_eq!(reloaded.custom_names(), vec!["Shmups"]);
    reloaded.collection("Shmups", &store).unwrap();
    assert_eq!(
        paths(&reloaded, &store, "Shmups"),
        vec![env.rom_path("snes", "contra.sfc"), env.rom_path("snes", "smetroid.sfc")]
    );
}

#[test]
fn test_tool_members_survive_reload() {
    let env = CollectionsTestEnv::new();
    let mut store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);

    manager.create_custom_collection("Tools", &store).unwrap();
    manager.set_edit_mode("Tools", &store).unwrap();
    let contra = id_of(&store, &env, "snes", "contra.sfc");
    let wifi = id_of(&store, &env, "retropie", "wifi.sh");
    manager.toggle_membership(&mut store, contra).unwrap();
    manager.toggle_membership(&mut store, wifi).unwrap();
    manager.exit_edit_mode(&store).unwrap();
    assert_eq!(manager.get("Tools").unwrap().len(), 2);

    let config = manager.config().clone();
    let mut reloaded = env.loaded(config, &[], &store);
    reloaded.collection("Tools", &store).unwrap();
    assert_eq!(
        paths(&reloaded, &store, "Tools"),
        vec![env.rom_path("snes", "contra.sfc"), env.rom_path("retropie", "wifi.sh")]
    );
    // not in All Games, still a member
    assert!(!reloaded.collection("all", &store).unwrap().contains(wifi));
}

#[test]
fn test_last_played_stays_bounded() {
    let env = CollectionsTestEnv::new();
    let mut store = GameStore::new();
    store.add_system(SystemLibrary::new("nes", "/roms/nes"));
    let ids: Vec<GameId> = (0..LAST_PLAYED_MAX + 10)
        .map(|i| store.insert(Game::new(format!("/roms/nes/{i:02}.nes"), "nes", format!("Game {i:02}"))))
        .collect();

    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);
    assert!(manager.get("recent").unwrap().is_empty());

    for (i, id) in ids.iter().enumerate() {
        let game = store.get_mut(*id).unwrap();
        game.play_count += 1;
        game.last_played = Some(format!("2024-05-01 12:00:{:02}", i));
        manager.on_game_changed(&store, *id);
        assert!(manager.get("recent").unwrap().len() <= LAST_PLAYED_MAX);
    }

    let expected: Vec<GameId> = ids[10..].iter().rev().copied().collect();
    assert_eq!(manager.get("recent").unwrap().games(), expected);

    let removed = manager
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, CollectionEvent::Removed { collection, .. } if collection == "recent"))
        .count();
    assert_eq!(removed, 10);

    // playing an old game again pushes out the oldest retained one
    let game = store.get_mut(ids[0]).unwrap();
    game.play_count += 1;
    game.last_played = Some("2024-05-01 13:00:00".to_string());
    manager.on_game_changed(&store, ids[0]);

    let recent = manager.get("recent").unwrap();
    assert_eq!(recent.len(), LAST_PLAYED_MAX);
    assert_eq!(recent.games()[0], ids[0]);
    assert!(!recent.contains(ids[10]));
    assert!(recent.contains(ids[11]));
    manager.drain_events();

    // too old to make the cut: no events for an entry never shown
    let game = store.get_mut(ids[10]).unwrap();
    game.play_count += 1;
    game.last_played = Some("2024-04-01 00:00:00".to_string());
    manager.on_game_changed(&store, ids[10]);

    let recent = manager.get("recent").unwrap();
    assert_eq!(recent.len(), LAST_PLAYED_MAX);
    assert!(!recent.contains(ids[10]));
    assert!(manager.drain_events().iter().all(|e| e.collection() != "recent"));
}

#[test]
fn test_favorites_follow_the_flag() {
    let env = CollectionsTestEnv::new();
    let mut store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);
    let ids: Vec<GameId> = store.iter().map(|(id, _)| id).collect();

    for (step, id) in ids.iter().cycle().take(17).enumerate() {
        match step % 3 {
            0 => {
                let game = store.get_mut(*id).unwrap();
                game.favorite = !game.favorite;
                manager.on_game_changed(&store, *id);
            }
            1 => {
                let mut edit = GameMetadata::new();
                edit.genre = Some(format!("Genre {step}"));
                manager.edit_game(&mut store, *id, &edit).unwrap();
            }
            _ => {
                let outcome = manager.toggle_membership(&mut store, *id).unwrap();
                assert_eq!(outcome.collection(), "favorites");
            }
        }

        let actual: BTreeSet<GameId> = manager.get("favorites").unwrap().games().into_iter().collect();
        assert_eq!(actual, favorites_in_store(&store), "after step {}", step);
    }
}

#[test]
fn test_favorite_toggle_includes_non_game_systems() {
    let env = CollectionsTestEnv::new();
    let mut store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);
    manager.drain_events();

    let wifi = id_of(&store, &env, "retropie", "wifi.sh");
    let outcome = manager.toggle_membership(&mut store, wifi).unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::Added {
            collection: "favorites".to_string()
        }
    );
    assert!(manager.get("favorites").unwrap().contains(wifi));
    assert!(manager.drain_events().contains(&CollectionEvent::Sorted {
        collection: "favorites".to_string()
    }));

    let outcome = manager.toggle_membership(&mut store, wifi).unwrap();
    assert!(matches!(outcome, ToggleOutcome::Removed { .. }));
    assert!(manager.get("favorites").unwrap().is_empty());
    assert!(manager.drain_events().contains(&CollectionEvent::Removed {
        collection: "favorites".to_string(),
        game: wifi,
    }));
}

#[test]
fn test_unique_names() {
    let env = CollectionsTestEnv::new();
    let store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);

    assert_eq!(manager.create_custom_collection("My Favs", &store).unwrap(), "My Favs");
    assert_eq!(manager.create_custom_collection("My Favs", &store).unwrap(), "My Favs (1)");
    assert_eq!(manager.create_custom_collection("My Favs", &store).unwrap(), "My Favs (2)");

    assert_eq!(manager.generate_unique_name("snes", &store), "snes (1)");
    assert_eq!(manager.generate_unique_name("auto-favorites", &store), "auto-favorites (1)");
    assert_eq!(manager.generate_unique_name("all", &store), "all (1)");
    assert_eq!(manager.generate_unique_name("!!!", &store), "New Collection");
    assert_eq!(manager.generate_unique_name("Best: Ever?", &store), "Best Ever");

    for name in ["My Favs", "My Favs (1)", "My Favs (2)"] {
        assert!(env.collections_dir().join(format!("custom-{name}.cfg")).exists());
    }
}

#[test]
fn test_bundle_index_matches_members() {
    let env = CollectionsTestEnv::new();
    let mut store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);

    let beat = manager.create_custom_collection("Beat em ups", &store).unwrap();
    let metroid = manager.create_custom_collection("Metroidvania", &store).unwrap();
    manager.rebuild_display_list(&store).unwrap();
    assert_eq!(manager.bundle().members(), &[beat.clone(), metroid.clone()]);
    assert!(manager.display_list().contains(&Catalog::Bundle));
    assert!(!manager.display_list().contains(&Catalog::Collection(metroid.clone())));

    let smetroid = id_of(&store, &env, "snes", "smetroid.sfc");
    let fusion = id_of(&store, &env, "gba", "fusion.gba");
    let contra = id_of(&store, &env, "snes", "contra.sfc");

    manager.set_edit_mode(&metroid, &store).unwrap();
    manager.toggle_membership(&mut store, smetroid).unwrap();
    manager.toggle_membership(&mut store, fusion).unwrap();
    manager.set_edit_mode(&beat, &store).unwrap();
    manager.toggle_membership(&mut store, contra).unwrap();
    manager.toggle_membership(&mut store, smetroid).unwrap();

    let queries = [
        FilterQuery::new(),
        FilterQuery::new().with(FilterType::System, "snes"),
        FilterQuery::new().with(FilterType::System, "gba"),
        FilterQuery::new().with(FilterType::Favorite, "true"),
        FilterQuery::new().with(FilterType::Genre, "Unknown"),
    ];
    let assert_equivalent = |manager: &CollectionManager| {
        for query in &queries {
            let merged: BTreeSet<GameId> = [&beat, &metroid]
                .iter()
                .flat_map(|name| manager.get(name).unwrap().query(query))
                .collect();
            assert_eq!(manager.bundle().query(query), merged, "{:?}", query);
        }
    };
    assert_equivalent(&manager);
    assert_eq!(manager.bundle_games().len(), 4);

    // still held by the other member
    manager.set_edit_mode(&metroid, &store).unwrap();
    manager.toggle_membership(&mut store, smetroid).unwrap();
    assert!(manager.bundle().index().contains(smetroid));
    assert_equivalent(&manager);

    store.get_mut(smetroid).unwrap().favorite = true;
    manager.on_game_changed(&store, smetroid);
    assert_equivalent(&manager);
    assert_eq!(
        manager.bundle().query(&FilterQuery::new().with(FilterType::Favorite, "true")),
        BTreeSet::from([smetroid])
    );
}

#[test]
fn test_themed_collections_and_sorting() {
    let env = CollectionsTestEnv::new();
    let store = env.store();
    let config = CollectionsConfig {
        sort_all_systems: true,
        ..Default::default()
    };
    let mut manager = env.loaded(config, &["Metroidvania"], &store);
    manager.create_custom_collection("Metroidvania", &store).unwrap();
    manager.create_custom_collection("Beat em ups", &store).unwrap();
    manager.rebuild_display_list(&store).unwrap();

    assert_eq!(
        manager.display_list(),
        &[
            Catalog::Bundle,
            Catalog::System("gba".to_string()),
            Catalog::Collection("Metroidvania".to_string()),
            Catalog::System("snes".to_string()),
            Catalog::System("retropie".to_string()),
            Catalog::Collection("favorites".to_string()),
            Catalog::Collection("recent".to_string()),
        ]
    );
    assert_eq!(manager.bundle().members(), &["Beat em ups".to_string()]);
}

#[test]
fn test_bundling_disabled_lists_collections_directly() {
    let env = CollectionsTestEnv::new();
    let store = env.store();
    let config = CollectionsConfig {
        use_custom_collections_system: false,
        ..Default::default()
    };
    let mut manager = env.loaded(config, &[], &store);
    manager.create_custom_collection("Beat em ups", &store).unwrap();
    manager.rebuild_display_list(&store).unwrap();

    assert!(manager.bundle().is_empty());
    assert!(!manager.display_list().contains(&Catalog::Bundle));
    assert!(manager
        .display_list()
        .contains(&Catalog::Collection("Beat em ups".to_string())));
}

#[test]
fn test_disabling_edit_target_ends_session() {
    let env = CollectionsTestEnv::new();
    let mut store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);
    manager.create_custom_collection("Temp", &store).unwrap();
    manager.rebuild_display_list(&store).unwrap();

    manager.set_edit_mode("Temp", &store).unwrap();
    let chrono = id_of(&store, &env, "snes", "chrono.sfc");
    manager.toggle_membership(&mut store, chrono).unwrap();
    assert_eq!(manager.edit_session(), &EditSession::Custom("Temp".to_string()));

    manager.set_enabled("Temp", false).unwrap();
    manager.rebuild_display_list(&store).unwrap();

    assert_eq!(manager.edit_session(), &EditSession::Favorites);
    assert!(manager.config().enabled_custom().is_empty());
    let written = fs::read_to_string(env.collections_dir().join("custom-Temp.cfg")).unwrap();
    assert_eq!(written, "~/roms/snes/chrono.sfc\n");
}

#[test]
fn test_edit_mode_requires_custom_collection() {
    let env = CollectionsTestEnv::new();
    let store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);

    let err = manager.set_edit_mode("Nope", &store).unwrap_err();
    assert!(matches!(err, LibraryError::CollectionNotFound(_)));
    let err = manager.set_edit_mode("favorites", &store).unwrap_err();
    assert!(matches!(err, LibraryError::CollectionNotFound(_)));
    assert_eq!(manager.edit_session(), &EditSession::Favorites);
}

#[test]
fn test_deleted_game_leaves_collections() {
    let env = CollectionsTestEnv::new();
    let mut store = env.store();
    let mut manager = env.loaded(CollectionsConfig::default(), &[], &store);
    manager.create_custom_collection("RPGs", &store).unwrap();
    manager.set_edit_mode("RPGs", &store).unwrap();
    let chrono = id_of(&store, &env, "snes", "chrono.sfc");
    let awars = id_of(&store, &env, "gba", "awars.gba");
    manager.toggle_membership(&mut store, chrono).unwrap();
    manager.toggle_membership(&mut store, awars).unwrap();
    manager.exit_edit_mode(&store).unwrap();
    manager.drain_events();

    manager.on_game_deleted(chrono);
    store.remove(chrono);

    let rpgs = manager.get("RPGs").unwrap();
    assert_eq!(rpgs.games(), vec![awars]);
    assert!(rpgs.needs_persist());
    assert_eq!(
        manager.try_recv(),
        Some(CollectionEvent::Removed {
            collection: "RPGs".to_string(),
            game: chrono,
        })
    );

    manager.shutdown(&store).unwrap();
    let written = fs::read_to_string(env.collections_dir().join("custom-RPGs.cfg")).unwrap();
    assert_eq!(written, "~/roms/gba/awars.gba\n");
}

#[tokio::test]
async fn test_scan_restore_and_collect() {
    let env = CollectionsTestEnv::new();
    let roms = env.home.join("roms");
    for (system, file, _) in GAMES {
        fs::create_dir_all(roms.join(system)).unwrap();
        fs::write(roms.join(system).join(file), b"ROM").unwrap();
    }

    let scanner = RomScanner::new();
    let (mut store, result) = scanner
        .scan_into_store(&roms, |system| system != "retropie")
        .await
        .unwrap();
    assert_eq!(result.games_found, GAMES.len());

    let db = GameDatabase::in_memory().unwrap();
    db.sync_store(&mut store).unwrap();
    db.set_favorite(&env.rom_path("gba", "fusion.gba"), true).unwrap();
    db.update_play_stats(&env.rom_path("snes", "chrono.sfc"), 600).unwrap();
    db.update_play_stats(&env.rom_path("retropie", "wifi.sh"), 5).unwrap();

    let (mut store, _) = scanner
        .scan_into_store(&roms, |system| system != "retropie")
        .await
        .unwrap();
    assert_eq!(db.sync_store(&mut store).unwrap(), GAMES.len());

    let config = CollectionsConfig {
        auto_enabled: "all,favorites,recent".to_string(),
        ..Default::default()
    };
    let manager = env.loaded(config, &[], &store);

    assert_eq!(
        paths(&manager, &store, "favorites"),
        vec![env.rom_path("gba", "fusion.gba")]
    );
    // tools do not count as played games
    assert_eq!(
        paths(&manager, &store, "recent"),
        vec![env.rom_path("snes", "chrono.sfc")]
    );
    assert_eq!(manager.get("all").unwrap().len(), 5);
}

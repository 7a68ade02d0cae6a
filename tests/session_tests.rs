//! TripwireModule, TokenUpdateCoordinator and PostTriggerActions tests

mod common;

#[cfg(test)]
mod tests {
    use crate::common::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tokio_test::assert_ok;
    use tripwire::{
        authoring::TripTileSpec,
        macros::MacroOutcome,
        types::{ChangeOrigin, TokenChange},
        CoordinationOutcome, DocumentEvent, Disposition, LocalBus, MacroId, MemoryStore, Point,
        Rect, SceneId, TokenPhase, TriggerOutcome, TripwireConfig,
    };

    async fn gm_session(
        config: TripwireConfig,
    ) -> (Arc<MemoryStore>, Client, tripwire::TripwireModule) {
        let store = Arc::new(MemoryStore::new());
        let gm = Client::gm(store.clone());
        let (module, _socket) =
            open_scene(&gm, config, Arc::new(LocalBus::new().endpoint())).await;
        (store, gm, module)
    }

    // -----------------------------------------------------------------------
    // Coordinator phases
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn phase_moves_from_pending_back_to_idle() {
        let (store, _gm, module) = gm_session(fast_config()).await;
        corridor_tile(&store);
        let hero = hero_at(&store, Point::new(0.0, 0.0));
        let coordinator = module.coordinator().unwrap();

        assert_eq!(coordinator.phase(&hero.id), TokenPhase::Idle);
        module.before_token_update(&hero);
        assert_eq!(
            coordinator.phase(&hero.id),
            TokenPhase::PendingMove {
                before: Point::new(0.0, 0.0)
            }
        );

        let (_, after, change) = assert_ok!(store.move_token(&hero.id, Point::new(0.0, 300.0)));
        let outcome = module.after_token_update(&after, &change).await;
        assert!(matches!(outcome, CoordinationOutcome::NoTrigger));
        assert_eq!(coordinator.phase(&hero.id), TokenPhase::Idle);
    }

    #[tokio::test]
    async fn evaluation_without_registration_does_nothing() {
        let (store, _gm, module) = gm_session(fast_config()).await;
        let tile = corridor_tile(&store);
        let hero = hero_at(&store, Point::new(0.0, 0.0));

        let (_, after, change) = assert_ok!(store.move_token(&hero.id, Point::new(200.0, 0.0)));
        let outcome = module.after_token_update(&after, &change).await;

        assert!(matches!(outcome, CoordinationOutcome::NoPendingMove));
        assert!(!store.tile_now(&tile.id).unwrap().is_triggered());
    }

    #[tokio::test]
    async fn standing_still_inside_a_tile_never_triggers() {
        let (store, _gm, module) = gm_session(fast_config()).await;
        corridor_tile(&store);
        let hero = hero_at(&store, Point::new(100.0, 0.0));

        module.before_token_update(&hero);
        let change = TokenChange::movement(hero.position());
        let outcome = module.after_token_update(&hero, &change).await;
        assert!(matches!(outcome, CoordinationOutcome::NoTrigger));
    }

    #[tokio::test]
    async fn newer_registration_replaces_older_one() {
        let (store, _gm, module) = gm_session(fast_config()).await;
        let tile = corridor_tile(&store);
        let hero = hero_at(&store, Point::new(0.0, 0.0));

        module.before_token_update(&hero);
        let mut moved_on = hero.clone();
        moved_on.x = 180.0;
        module.before_token_update(&moved_on);

        let (_, after, change) = assert_ok!(store.move_token(&hero.id, Point::new(200.0, 0.0)));
        let outcome = module.after_token_update(&after, &change).await;
        assert!(matches!(outcome, CoordinationOutcome::NoTrigger));
        assert!(!store.tile_now(&tile.id).unwrap().is_triggered());
    }

    // -----------------------------------------------------------------------
    // Eligibility
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn hostile_tokens_are_ineligible_and_discarded() {
        let (store, _gm, module) = gm_session(fast_config()).await;
        let tile = corridor_tile(&store);
        let mut hero = hero_at(&store, Point::new(0.0, 0.0));
        hero.disposition = Disposition::Hostile;
        let hero = store.insert_token(hero);

        module.before_token_update(&hero);
        let (_, after, change) = assert_ok!(store.move_token(&hero.id, Point::new(200.0, 0.0)));
        let outcome = module.after_token_update(&after, &change).await;

        assert!(matches!(outcome, CoordinationOutcome::Ineligible));
        assert_eq!(
            module.coordinator().unwrap().phase(&hero.id),
            TokenPhase::Idle
        );
        assert!(!store.tile_now(&tile.id).unwrap().is_triggered());
    }

    #[tokio::test]
    async fn paused_session_is_ineligible() {
        let (store, gm, module) = gm_session(fast_config()).await;
        corridor_tile(&store);
        let hero = hero_at(&store, Point::new(0.0, 0.0));
        gm.authority.set_paused(true);

        module.before_token_update(&hero);
        let (_, after, change) = assert_ok!(store.move_token(&hero.id, Point::new(200.0, 0.0)));
        assert!(matches!(
            module.after_token_update(&after, &change).await,
            CoordinationOutcome::Ineligible
        ));
    }

    #[tokio::test]
    async fn other_scene_tokens_are_ignored() {
        let (store, _gm, module) = gm_session(fast_config()).await;
        corridor_tile(&store);
        let mut hero = hero_at(&store, Point::new(0.0, 0.0));
        hero.scene_id = SceneId::new("elsewhere");
        let hero = store.insert_token(hero);

        module.before_token_update(&hero);
        let (_, after, change) = assert_ok!(store.move_token(&hero.id, Point::new(200.0, 0.0)));
        assert!(matches!(
            module.after_token_update(&after, &change).await,
            CoordinationOutcome::Ineligible
        ));
    }

    #[tokio::test]
    async fn trigger_snap_does_not_feed_back() {
        let (store, _gm, module) = gm_session(fast_config()).await;
        let tile = store.create_trip_tile(TripTileSpec {
            unlimited: true,
            ..trip_spec("repeat", Rect::from_extents(50.0, 150.0, -10.0, 10.0))
        });
        let hero = hero_at(&store, Point::new(0.0, 0.0));
        let mut events = store.subscribe();

        // Drive through the sync feed like a remote client would.
        assert_ok!(store.move_token(&hero.id, Point::new(200.0, 0.0)));
        let moved = assert_ok!(events.recv().await);
        let outcome = module.handle_document_event(&moved).await;
        assert!(
            matches!(outcome, Some(CoordinationOutcome::Delegated(ref t)) if t.is_executed())
        );

        let mut snaps = 0;
        while let Ok(event) = events.try_recv() {
            if let DocumentEvent::TokenUpdated { ref change, .. } = event {
                assert_eq!(change.origin, ChangeOrigin::TriggerSnap);
                snaps += 1;
                assert!(matches!(
                    module.handle_document_event(&event).await,
                    Some(CoordinationOutcome::Ineligible)
                ));
            }
        }
        assert_eq!(snaps, 1);
        assert!(!store.tile_now(&tile.id).unwrap().is_triggered());
    }

    // -----------------------------------------------------------------------
    // Post-trigger actions
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn actions_pan_react_and_pause() {
        let config = TripwireConfig {
            pause_on_trigger: true,
            ..fast_config()
        };
        let (store, gm, module) = gm_session(config).await;
        let tile = corridor_tile(&store);
        let hero = hero_at(&store, Point::new(0.0, 0.0));

        let outcome = module
            .socket()
            .unwrap()
            .request_trigger(&tile, &hero, Point::new(50.0, 0.0))
            .await;
        let TriggerOutcome::Executed(report) = outcome else {
            panic!("expected execution, got {:?}", outcome);
        };

        assert_eq!(report.macro_outcome, MacroOutcome::NoMacro);
        assert_ok!(report.pan.await);
        assert_eq!(*gm.camera.pans.lock(), vec![Point::new(50.0, -10.0)]);
        assert_eq!(gm.clock.pauses.load(Ordering::SeqCst), 1);

        assert_ok!(report.reaction.expect("reaction").await);
        let spawned = gm.layer.spawned.lock().clone();
        assert_eq!(spawned.len(), 1);
        let (asset, anchor, size) = &spawned[0];
        assert!(asset.ends_with("reaction-exclamation.svg"));
        // Centred over the snapped token, lifted by the offset.
        assert_eq!(*anchor, Point::new(100.0, -18.0));
        assert_eq!(*size, 50.0);
        assert_eq!(gm.layer.removed.lock().len(), 1);
    }

    #[tokio::test]
    async fn no_anim_type_means_no_reaction() {
        let (store, gm, module) = gm_session(fast_config()).await;
        let tile = store.create_trip_tile(TripTileSpec {
            anim_type: tripwire::AnimType::None,
            ..trip_spec("quiet", Rect::from_extents(50.0, 150.0, -10.0, 10.0))
        });
        let hero = hero_at(&store, Point::new(0.0, 0.0));

        let outcome = module
            .socket()
            .unwrap()
            .request_trigger(&tile, &hero, Point::new(50.0, 0.0))
            .await;
        let TriggerOutcome::Executed(report) = outcome else {
            panic!("expected execution, got {:?}", outcome);
        };
        assert!(report.reaction.is_none());
        assert!(gm.layer.spawned.lock().is_empty());
    }

    #[tokio::test]
    async fn macro_runs_for_the_triggering_token() {
        let store = Arc::new(MemoryStore::new());
        let gm = Client::new(
            store.clone(),
            tripwire::StaticAuthority::gm("gm"),
            RecordingMacros::with(&["m1"]),
        );
        let (module, socket) =
            open_scene(&gm, fast_config(), Arc::new(LocalBus::new().endpoint())).await;
        let tile = store.create_trip_tile(TripTileSpec {
            macro_id: Some(MacroId::new("m1")),
            ..trip_spec("trap", Rect::from_extents(50.0, 150.0, -10.0, 10.0))
        });
        let hero = hero_at(&store, Point::new(0.0, 0.0));

        module.before_token_update(&hero);
        let (_, after, change) = assert_ok!(store.move_token(&hero.id, Point::new(200.0, 0.0)));
        module.after_token_update(&after, &change).await;

        assert_eq!(
            *gm.macros.runs.lock(),
            vec![(MacroId::new("m1"), hero.id.clone())]
        );
        assert!(socket.is_active());
    }

    #[tokio::test]
    async fn failing_or_missing_macro_does_not_stop_the_trigger() {
        for (macros, expected) in [
            (
                RecordingMacros::failing(&["m1"]),
                MacroOutcome::Failed(MacroId::new("m1")),
            ),
            (
                RecordingMacros::default(),
                MacroOutcome::Missing(MacroId::new("m1")),
            ),
        ] {
            let store = Arc::new(MemoryStore::new());
            let gm = Client::new(store.clone(), tripwire::StaticAuthority::gm("gm"), macros);
            let (_module, socket) =
                open_scene(&gm, fast_config(), Arc::new(LocalBus::new().endpoint())).await;
            let tile = store.create_trip_tile(TripTileSpec {
                macro_id: Some(MacroId::new("m1")),
                ..trip_spec("trap", Rect::from_extents(50.0, 150.0, -10.0, 10.0))
            });
            let hero = hero_at(&store, Point::new(0.0, 0.0));

            let outcome = socket
                .request_trigger(&tile, &hero, Point::new(50.0, 0.0))
                .await;
            let TriggerOutcome::Executed(report) = outcome else {
                panic!("expected execution, got {:?}", outcome);
            };
            assert_eq!(report.macro_outcome, expected);
            assert!(report.snapped.is_some());
            assert!(report.flipped);
            assert!(store.tile_now(&tile.id).unwrap().is_triggered());
        }
    }
}

// Scenario tests for the scan session host

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::command::{CommandContext, ScanCommand};
    use super::super::errors::*;
    use super::super::lifecycle::{RedirectOutcome, RedirectPhase};
    use super::super::mocks::*;
    use super::super::mode::{BoxedCommand, BoxedRedirect, Capability};
    use super::super::registry::{ModeRegistry, RegistryBuilder};
    use super::super::session::{ScanOutcome, ScanSession, SessionSettings};
    use super::super::substitution::StateSubstitutionRule;
    use super::super::traits::*;
    use super::super::types::*;

    struct Fixture {
        session: ScanSession<TestBasis>,
        store: Arc<MockDocumentStore>,
    }

    fn registry() -> Arc<ModeRegistry<TestBasis>> {
        let a = TestMode::two_state("A")
            .with_capabilities(&[Capability::AcceptsRedirects])
            .with_redirect(|| Box::new(TestRedirect::new("GO", "B", "DOC")) as BoxedRedirect<TestBasis>)
            .with_redirect(|| Box::new(TestRedirect::new("NOPE", "B", "DOC").impossible()) as BoxedRedirect<TestBasis>)
            .with_command(|| Box::new(RedirectCommand::new("JUMP", "GO")) as BoxedCommand<TestBasis>)
            .with_command(|| Box::new(FailingCommand::returning_false("FAIL")) as BoxedCommand<TestBasis>)
            .with_command(|| Box::new(FailingCommand::rejecting("REJECT", "Nothing to do.")) as BoxedCommand<TestBasis>)
            .with_command(|| Box::new(DocumentCommand::new("DOCCMD")) as BoxedCommand<TestBasis>);
        let b = TestMode::two_state("B")
            .with_redirect(|| Box::new(TestRedirect::new("BACK", "A", "DOC")) as BoxedRedirect<TestBasis>);
        let c = TestMode::two_state("C").with_follow_up("A");

        Arc::new(RegistryBuilder::new().mode(a).mode(b).mode(c).build().unwrap())
    }

    fn fixture_with(services: impl FnOnce(Arc<MockDocumentStore>) -> Services, mode: &str) -> Fixture {
        let store = Arc::new(MockDocumentStore::seeded());
        let session = ScanSession::new(
            registry(),
            services(store.clone()),
            TestBasis::default(),
            &ModeCode::from(mode),
        )
        .unwrap();
        Fixture { session, store }
    }

    fn fixture(mode: &str) -> Fixture {
        fixture_with(|store| mock_services(store, Arc::new(RecordingExecutor::new())), mode)
    }

    fn at(state: &str) -> Position {
        Position::At(StateCode::from(state))
    }

    fn count(session: &ScanSession<TestBasis>, kind: ReportKind) -> usize {
        session.reports().iter().filter(|r| r.kind == kind).count()
    }

    /// Scan a document in A and jump into B with the token armed
    fn armed_in_b(f: &mut Fixture, doc: &str) {
        f.session.process_scan(doc).unwrap();
        let outcome = f.session.redirect(&RedirectCode::from("GO")).unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::RedirectEntered {
                redirect: RedirectCode::from("GO"),
                mode: ModeCode::from("B"),
                armed: true,
            }
        );
    }

    #[test]
    fn test_scan_advances_and_records_value() {
        let mut f = fixture("A");
        assert_eq!(f.session.position(), &at("DOC"));

        let outcome = f.session.process_scan("d-1").unwrap();
        match outcome {
            ScanOutcome::Accepted { state, value, next } => {
                assert_eq!(state, "DOC");
                assert_eq!(value.value, "D-1");
                assert_eq!(next, at("ITEM"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(f.session.basis().doc_nbr.as_deref(), Some("D-1"));
        assert_eq!(f.session.value_of("DOC").unwrap().raw, "d-1");
        assert_eq!(f.store.get_lookups(), vec!["D-1".to_string()]);
        assert_eq!(count(&f.session, ReportKind::Info), 1);
    }

    #[test]
    fn test_invalid_scan_reports_and_stays() {
        let mut f = fixture("A");

        let result = f.session.process_scan("D-3");
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert_eq!(f.session.position(), &at("DOC"));
        assert!(f.session.basis().doc_nbr.is_none());

        let last = f.session.reports().last().unwrap();
        assert_eq!(last.kind, ReportKind::Error);
        assert_eq!(last.message.render(), "D-3 is cancelled.");
    }

    #[test]
    fn test_invalid_scan_in_between_changes_nothing() {
        let mut direct = fixture("A");
        direct.session.process_scan("D-1").unwrap();

        let mut detour = fixture("A");
        detour.session.process_scan("D-1").unwrap();
        assert!(detour.session.process_scan("not an item").is_err());
        assert!(detour.session.process_scan("D-404").is_err());

        assert_eq!(direct.session.position(), detour.session.position());
        assert_eq!(direct.session.basis(), detour.session.basis());
        assert_eq!(direct.session.values(), detour.session.values());

        let a = direct.session.process_scan("ITEM-1").unwrap();
        let b = detour.session.process_scan("ITEM-1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_store_outage_is_a_validation_error() {
        let mut f = fixture("A");
        f.store.set_unavailable(true);

        let err = f.session.process_scan("D-1").unwrap_err();
        assert_eq!(
            err.message().render(),
            "Document store unavailable: mock store offline"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_full_and_partial_reset() {
        let mut f = fixture("A");
        f.session.process_scan("D-1").unwrap();
        f.session.execute_command(&CommandCode::from("NOTE")).unwrap();
        assert_eq!(f.session.basis().notes, vec!["noted".to_string()]);

        let outcome = f.session.reset(false);
        assert_eq!(outcome, ScanOutcome::Reset { full: false });
        assert_eq!(f.session.basis().doc_nbr.as_deref(), Some("D-1"));
        assert_eq!(f.session.basis().notes.len(), 1);
        assert!(f.session.values().is_empty());
        assert_eq!(f.session.position(), &at("DOC"));

        f.session.reset(true);
        assert!(f.session.basis().doc_nbr.is_none());
        assert!(f.session.basis().notes.is_empty());
        assert_eq!(f.session.position(), &at("DOC"));
    }

    #[test]
    fn test_completion_restarts_mode_keeping_identity() {
        let mut f = fixture("A");
        f.session.process_scan("D-1").unwrap();
        let outcome = f.session.process_scan("ITEM-1").unwrap();

        assert_eq!(
            outcome,
            ScanOutcome::ModeCompleted {
                completed: ModeCode::from("A"),
                mode: ModeCode::from("A"),
                position: at("DOC"),
                redirect: None,
            }
        );
        assert_eq!(f.session.basis().doc_nbr.as_deref(), Some("D-1"));
        assert!(f.session.basis().last_item.is_none());
        assert!(f.session.values().is_empty());
    }

    #[test]
    fn test_completion_enters_follow_up_mode() {
        let mut f = fixture("C");
        f.session.process_scan("D-1").unwrap();
        let outcome = f.session.process_scan("ITEM-1").unwrap();

        match outcome {
            ScanOutcome::ModeCompleted { completed, mode, .. } => {
                assert_eq!(completed, "C");
                assert_eq!(mode, "A");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(f.session.current_mode(), &ModeCode::from("A"));
    }

    #[test]
    fn test_veto_leaves_session_unchanged() {
        let mut f = fixture("A");
        f.session.process_scan("D-1").unwrap();
        f.store.set_status("D-1", DocumentStatus::Cancelled);
        let before = f.session.snapshot();

        let err = f.session.redirect(&RedirectCode::from("GO")).unwrap_err();
        assert!(matches!(err, EngineError::RedirectVeto { .. }));
        assert_eq!(err.message().render(), "D-1 is cancelled.");

        let after = f.session.snapshot();
        assert_eq!(after.mode, before.mode);
        assert_eq!(after.position, before.position);
        assert_eq!(after.values, before.values);
        assert!(after.armed.is_none());
        assert_eq!(f.session.basis().doc_nbr.as_deref(), Some("D-1"));
        assert_eq!(f.session.redirect_phase(), RedirectPhase::Idle);
        assert_eq!(f.session.last_redirect_outcome(), Some(RedirectOutcome::Vetoed));
        assert_eq!(f.session.reports().last().unwrap().kind, ReportKind::Error);
    }

    #[test]
    fn test_impossible_redirect_never_prepares() {
        let mut f = fixture("A");
        f.session.process_scan("D-1").unwrap();
        let lookups = f.store.get_lookups().len();

        let err = f.session.redirect(&RedirectCode::from("NOPE")).unwrap_err();
        assert!(matches!(err, EngineError::RedirectNotPossible { .. }));
        assert_eq!(f.store.get_lookups().len(), lookups);
        assert_eq!(f.session.last_redirect_outcome(), None);
        assert_eq!(f.session.current_mode(), &ModeCode::from("A"));
    }

    #[test]
    fn test_unarmed_redirect_has_no_compensation() {
        let mut f = fixture("A");
        let outcome = f.session.redirect(&RedirectCode::from("GO")).unwrap();
        assert!(matches!(outcome, ScanOutcome::RedirectEntered { armed: false, .. }));
        assert!(f.session.armed_redirect().is_none());
        assert_eq!(f.session.last_redirect_outcome(), Some(RedirectOutcome::Entered));

        f.session.process_scan("D-1").unwrap();
        let outcome = f.session.process_scan("ITEM-1").unwrap();
        assert!(matches!(outcome, ScanOutcome::ModeCompleted { redirect: None, .. }));
        assert_eq!(f.session.current_mode(), &ModeCode::from("B"));
    }

    #[test]
    fn test_completion_replays_exactly_once() {
        let mut f = fixture("A");
        armed_in_b(&mut f, "D-1");
        assert_eq!(f.session.redirect_phase(), RedirectPhase::TargetRunning);
        assert_eq!(f.session.armed_redirect().unwrap().token.as_str(), "D-1");

        f.session.process_scan("D-1").unwrap();
        let outcome = f.session.process_scan("ITEM-9").unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::ModeCompleted {
                completed: ModeCode::from("B"),
                mode: ModeCode::from("A"),
                position: at("DOC"),
                redirect: Some(RedirectOutcome::Resumed),
            }
        );
        assert!(f.session.armed_redirect().is_none());
        assert_eq!(f.session.value_of("DOC").unwrap().value, "D-1");

        let replays = |s: &ScanSession<TestBasis>| {
            s.reports()
                .iter()
                .filter(|r| r.message.render() == "DOC: D-1 accepted.")
                .count()
        };
        assert_eq!(replays(&f.session), 1);

        assert_eq!(f.session.poll_redirect(), None);
        assert_eq!(replays(&f.session), 1);
        assert_eq!(f.session.redirect_phase(), RedirectPhase::Idle);
    }

    #[test]
    fn test_cancel_abandons_without_replay() {
        let mut f = fixture("A");
        armed_in_b(&mut f, "D-1");
        let lookups = f.store.get_lookups().len();

        let outcome = f.session.process_scan("@CANCEL").unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Cancelled {
                cancelled: ModeCode::from("B"),
                mode: ModeCode::from("A"),
                redirect: Some(RedirectOutcome::Abandoned),
            }
        );
        assert!(f.session.armed_redirect().is_none());
        assert!(f.session.values().is_empty());
        assert_eq!(f.session.position(), &at("DOC"));
        assert_eq!(f.store.get_lookups().len(), lookups);

        assert_eq!(f.session.poll_redirect(), None);
        assert_eq!(f.session.last_redirect_outcome(), Some(RedirectOutcome::Abandoned));
    }

    #[test]
    fn test_mode_switch_abandons_target() {
        let mut f = fixture("A");
        armed_in_b(&mut f, "D-1");

        let outcome = f.session.process_scan("@C").unwrap();
        assert_eq!(outcome, ScanOutcome::ModeSwitched { mode: ModeCode::from("C") });
        assert!(f.session.armed_redirect().is_none());
        assert_eq!(f.session.last_redirect_outcome(), Some(RedirectOutcome::Abandoned));
    }

    #[test]
    fn test_second_redirect_rejected_while_armed() {
        let mut f = fixture("A");
        armed_in_b(&mut f, "D-1");

        let err = f.session.redirect(&RedirectCode::from("BACK")).unwrap_err();
        assert_eq!(
            err,
            EngineError::RedirectAlreadyArmed {
                armed: RedirectCode::from("GO"),
                requested: RedirectCode::from("BACK"),
            }
        );
        assert_eq!(f.session.current_mode(), &ModeCode::from("B"));
        assert_eq!(f.session.armed_redirect().unwrap().redirect, "GO");
        assert_eq!(f.session.redirect_phase(), RedirectPhase::TargetRunning);
    }

    #[test]
    fn test_redirect_round_trip_keeps_errors_drops_warnings() {
        let mut f = fixture("A");

        // X: D-2 is on hold, accepted with a warning
        f.session.process_scan("D-2").unwrap();
        assert_eq!(f.session.position(), &at("ITEM"));
        // Y: a rejected scan leaves an error behind
        assert!(f.session.process_scan("bogus").is_err());
        assert_eq!(count(&f.session, ReportKind::Warning), 1);
        assert_eq!(count(&f.session, ReportKind::Error), 1);

        f.session.redirect(&RedirectCode::from("GO")).unwrap();
        f.session.process_scan("D-2").unwrap();
        assert_eq!(count(&f.session, ReportKind::Warning), 2);
        let outcome = f.session.process_scan("ITEM-1").unwrap();

        assert!(matches!(
            outcome,
            ScanOutcome::ModeCompleted {
                redirect: Some(RedirectOutcome::Resumed),
                ..
            }
        ));
        assert_eq!(f.session.current_mode(), &ModeCode::from("A"));
        assert_eq!(f.session.position(), &at("DOC"));

        // Earlier positives are gone; the replay raised its own warning
        assert_eq!(count(&f.session, ReportKind::Warning), 1);
        assert_eq!(count(&f.session, ReportKind::Error), 1);
        assert!(f
            .session
            .reports()
            .iter()
            .all(|r| !r.message.render().contains("ITEM-1")));
        assert_eq!(
            f.session.reports()[0].message.render(),
            "bogus is not an item barcode."
        );
    }

    #[test]
    fn test_failed_command_leaves_no_trace() {
        let mut f = fixture("A");
        f.session.process_scan("D-1").unwrap();
        let basis = f.session.basis().clone();

        let err = f.session.execute_command(&CommandCode::from("FAIL")).unwrap_err();
        assert_eq!(
            err,
            EngineError::CommandFailure {
                command: CommandCode::from("FAIL"),
                reason: None,
            }
        );
        assert_eq!(f.session.basis(), &basis);
        assert_eq!(f.session.position(), &at("ITEM"));

        let err = f.session.execute_command(&CommandCode::from("REJECT")).unwrap_err();
        assert_eq!(err.message().render(), "Nothing to do.");
        assert_eq!(f.session.basis(), &basis);
        assert_eq!(f.session.reports().last().unwrap().message.render(), "Nothing to do.");
    }

    #[test]
    fn test_command_enablement_is_fresh() {
        let mut f = fixture("A");
        let enabled = |s: &ScanSession<TestBasis>| {
            s.available_commands()
                .into_iter()
                .find(|c| c.code == "DOCCMD")
                .map(|c| c.enabled)
        };
        assert_eq!(enabled(&f.session), Some(false));
        assert!(matches!(
            f.session.execute_command(&CommandCode::from("DOCCMD")),
            Err(EngineError::CommandDisabled(_))
        ));

        f.session.process_scan("D-1").unwrap();
        assert_eq!(enabled(&f.session), Some(true));
        f.session.execute_command(&CommandCode::from("DOCCMD")).unwrap();
        assert_eq!(f.session.basis().notes, vec!["document".to_string()]);
    }

    #[test]
    fn test_command_can_redirect() {
        let mut f = fixture("A");
        f.session.process_scan("D-1").unwrap();

        let outcome = f.session.execute_command(&CommandCode::from("JUMP")).unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::CommandExecuted {
                command: CommandCode::from("JUMP"),
                mode: ModeCode::from("B"),
            }
        );
        assert_eq!(f.session.basis().notes, vec!["jump GO".to_string()]);
        assert!(f.session.armed_redirect().is_some());
    }

    #[test]
    fn test_vetoed_command_redirect_rolls_back_basis() {
        let mut f = fixture("A");
        f.session.process_scan("D-1").unwrap();
        f.store.set_status("D-1", DocumentStatus::Cancelled);

        let err = f.session.execute_command(&CommandCode::from("JUMP")).unwrap_err();
        assert!(matches!(err, EngineError::RedirectVeto { .. }));
        assert!(f.session.basis().notes.is_empty());
        assert_eq!(f.session.current_mode(), &ModeCode::from("A"));
    }

    #[test]
    fn test_scanned_control_barcodes() {
        let mut f = fixture("A");

        let outcome = f.session.process_scan("@NOTE").unwrap();
        assert!(matches!(outcome, ScanOutcome::CommandExecuted { .. }));

        let outcome = f.session.process_scan("@B").unwrap();
        assert_eq!(outcome, ScanOutcome::ModeSwitched { mode: ModeCode::from("B") });

        let outcome = f.session.process_scan(" @RESET ").unwrap();
        assert_eq!(outcome, ScanOutcome::Reset { full: true });

        let err = f.session.process_scan("@ZZZ").unwrap_err();
        assert!(matches!(err, EngineError::UnknownCommand { .. }));

        let outcome = f.session.process_scan("@CANCEL").unwrap();
        assert!(matches!(outcome, ScanOutcome::Cancelled { redirect: None, .. }));
    }

    #[test]
    fn test_custom_command_prefix() {
        let mut f = fixture("A");
        f.session = f.session.with_settings(SessionSettings {
            command_prefix: "#".to_string(),
            ..SessionSettings::default()
        });

        assert!(matches!(
            f.session.process_scan("#NOTE").unwrap(),
            ScanOutcome::CommandExecuted { .. }
        ));
        assert!(matches!(f.session.process_scan("@NOTE"), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_try_process_by_honours_rule() {
        let mut f = fixture("A");
        f.session.process_scan("D-1").unwrap();
        assert!(f.session.process_scan("bogus").is_err());

        let ok = f
            .session
            .try_process_by(&StateCode::from("DOC"), "D-2", StateSubstitutionRule::REPLACE)
            .unwrap();
        assert!(ok);
        assert_eq!(f.session.position(), &at("ITEM"));
        assert_eq!(f.session.basis().doc_nbr.as_deref(), Some("D-2"));
        assert_eq!(count(&f.session, ReportKind::Error), 0);

        let ok = f
            .session
            .try_process_by(&StateCode::from("DOC"), "D-3", StateSubstitutionRule::KEEP_ALL)
            .unwrap();
        assert!(!ok);
        assert_eq!(f.session.basis().doc_nbr.as_deref(), Some("D-2"));

        f.session.set_default_state();
        f.session
            .try_process_by(&StateCode::from("DOC"), "D-1", StateSubstitutionRule::KEEP_STATE_CHANGE)
            .unwrap();
        assert_eq!(f.session.position(), &at("ITEM"));
        assert!(f.session.reports().iter().all(|r| r.kind != ReportKind::Error));

        let err = f
            .session
            .try_process_by(&StateCode::from("QTY"), "1", StateSubstitutionRule::KEEP_ALL)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownState { .. }));
    }

    #[test]
    fn test_failed_substitution_keeps_prior_reports() {
        let mut f = fixture("A");
        f.session.process_scan("D-2").unwrap();
        let before: Vec<ReportKind> = f.session.reports().iter().map(|r| r.kind).collect();
        assert_eq!(before, vec![ReportKind::Warning, ReportKind::Info]);

        let rule = StateSubstitutionRule::KEEP_ALL & !StateSubstitutionRule::KEEP_POSITIVE_REPORTS;
        let ok = f.session.try_process_by(&StateCode::from("DOC"), "D-3", rule).unwrap();
        assert!(!ok);

        let after: Vec<ReportKind> = f.session.reports().iter().map(|r| r.kind).collect();
        assert_eq!(after, vec![ReportKind::Warning, ReportKind::Info, ReportKind::Error]);
        assert_eq!(f.session.position(), &at("ITEM"));
        assert_eq!(f.session.basis().doc_nbr.as_deref(), Some("D-2"));
    }

    #[test]
    fn test_substitution_into_last_state_does_not_complete() {
        let mut f = fixture("C");
        f.session.process_scan("D-1").unwrap();

        let ok = f
            .session
            .try_process_by(&StateCode::from("ITEM"), "ITEM-7", StateSubstitutionRule::KEEP_ALL)
            .unwrap();
        assert!(ok);
        // no follow-up into A, just back to the default state of C
        assert_eq!(f.session.current_mode(), &ModeCode::from("C"));
        assert_eq!(f.session.position(), &at("DOC"));
        assert_eq!(f.session.value_of("ITEM").map(|v| v.value.as_str()), Some("ITEM-7"));
        assert!(f.session.last_redirect_outcome().is_none());
    }

    #[test]
    fn test_report_log_is_bounded() {
        let mut f = fixture("A");
        f.session = f.session.with_settings(SessionSettings {
            max_reports: 3,
            ..SessionSettings::default()
        });

        for _ in 0..5 {
            let _ = f.session.process_scan("D-404");
        }
        assert_eq!(f.session.reports().len(), 3);
        f.session.clear_reports();
        assert!(f.session.reports().is_empty());
    }

    #[test]
    fn test_unknown_initial_mode() {
        let store = Arc::new(MockDocumentStore::seeded());
        let result = ScanSession::new(
            registry(),
            mock_services(store, Arc::new(RecordingExecutor::new())),
            TestBasis::default(),
            &ModeCode::from("ZZ"),
        );
        assert!(matches!(result, Err(EngineError::UnknownMode(_))));
    }

    /// Fires one side effect for the document in progress
    struct EmitCommand;

    impl ScanCommand<TestBasis> for EmitCommand {
        fn code(&self) -> CommandCode {
            CommandCode::from("EMIT")
        }

        fn button_name(&self) -> &str {
            "Emit"
        }

        fn display_name(&self) -> &str {
            "Emit side effect"
        }

        fn process(&self, ctx: &mut CommandContext<'_, TestBasis>) -> Result<bool, ValidationError> {
            let doc = ctx.basis.doc_nbr.clone().unwrap_or_default();
            let request = SideEffectRequest::new("LABELS", EffectSource::None).with_parameter("RefNbr", doc);
            ctx.services
                .effects
                .execute(&request)
                .map_err(|e| ValidationError::new(e.to_string()))?;
            Ok(true)
        }
    }

    fn emitting_session(effects: MockSideEffectExecutor) -> ScanSession<TestBasis> {
        let mode = TestMode::two_state("E").with_command(|| Box::new(EmitCommand) as BoxedCommand<TestBasis>);
        let registry = Arc::new(RegistryBuilder::new().mode(mode).build().unwrap());
        let store = Arc::new(MockDocumentStore::seeded());
        ScanSession::new(
            registry,
            Services::new(store, Arc::new(effects)),
            TestBasis::default(),
            &ModeCode::from("E"),
        )
        .unwrap()
    }

    #[test]
    fn test_command_side_effect_parameters() {
        let mut effects = MockSideEffectExecutor::new();
        effects
            .expect_execute()
            .withf(|request| {
                request.action == "LABELS"
                    && request.source == EffectSource::None
                    && request.parameters.get("RefNbr").map(String::as_str) == Some("D-1")
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut session = emitting_session(effects);
        session.process_scan("D-1").unwrap();
        session.process_scan("@EMIT").unwrap();
    }

    #[test]
    fn test_side_effect_failure_is_command_failure() {
        let mut effects = MockSideEffectExecutor::new();
        effects.expect_execute().times(1).returning(|request| {
            Err(SideEffectError::Failed {
                action: request.action.clone(),
                reason: "printer offline".to_string(),
            })
        });

        let mut session = emitting_session(effects);
        session.process_scan("D-1").unwrap();
        let err = session.process_scan("@EMIT").unwrap_err();

        assert!(matches!(err, EngineError::CommandFailure { reason: Some(_), .. }));
        assert_eq!(err.message().render(), "Side effect LABELS failed: printer offline");
        assert_eq!(session.position(), &at("ITEM"));
    }
}

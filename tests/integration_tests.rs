use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use tempfile::TempDir;
use transformers_logging::core::handler::WriterSink;
use transformers_logging::infrastructure::env::{MapEnv, NO_ADVISORY_WARNINGS_VAR, VERBOSITY_VAR};
use transformers_logging::{
    Handler, Level, Progress, ProgressGate, ProgressIndicator, ProgressIteratorExt,
    VerbosityController,
};

/// Integration tests for the transformers-logging library
#[cfg(test)]
mod integration_tests {
    use super::*;

    fn controller(env: MapEnv) -> VerbosityController {
        VerbosityController::with_library_name(Arc::new(env), "lib")
    }

    #[test]
    fn test_default_configuration() {
        let controller = controller(MapEnv::new());
        assert_eq!(controller.get_verbosity(), Level::Warning);

        let root = controller.get_logger(None);
        assert_eq!(root.name(), "lib");
        assert!(!root.propagate());
        assert_eq!(root.handlers().len(), 1);
        assert!(controller.default_handler().is_some());
    }

    #[test]
    fn test_environment_sets_initial_verbosity() {
        let controller = controller(MapEnv::new().with(VERBOSITY_VAR, "error"));
        assert_eq!(controller.get_verbosity(), Level::Error);
    }

    #[test]
    fn test_verbosity_filters_child_records() {
        let controller = controller(MapEnv::new());
        let (handler, sink) = Handler::memory();
        controller.add_handler(&handler);

        let child = controller.get_logger(Some("lib.models.bert"));
        child.info("hidden");
        child.warning("shown");
        assert_eq!(sink.lines(), vec!["shown".to_string()]);

        controller.set_verbosity_info();
        child.info("now visible");
        assert_eq!(sink.len(), 2);

        controller.set_verbosity_error();
        child.warning("hidden again");
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_child_logger_name_normalization() {
        let controller = controller(MapEnv::new());
        let child = controller.get_logger(Some("lib::models"));
        assert_eq!(child.name(), "lib.models");
        assert_eq!(child.parent().unwrap().name(), "lib");
        assert_eq!(child.effective_level(), Level::Warning);
    }

    #[test]
    fn test_propagation_reaches_ancestor_handlers() {
        let controller = controller(MapEnv::new());
        controller.disable_default_handler();
        let (upstream, sink) = Handler::memory();
        controller.registry().root().add_handler(&upstream);

        let logger = controller.get_logger(None);
        logger.warning("isolated");
        assert!(sink.is_empty());

        controller.enable_propagation();
        logger.warning("propagated");
        assert_eq!(sink.lines(), vec!["propagated".to_string()]);

        controller.disable_propagation();
        logger.warning("isolated again");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_explicit_format_layout() {
        let controller = controller(MapEnv::new());
        let (handler, sink) = Handler::memory();
        controller.add_handler(&handler);
        controller.enable_explicit_format();

        controller.get_logger(None).warning("formatted");
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[WARNING|integration_tests.rs:"));
        assert!(lines[0].ends_with(" >> formatted"));

        controller.reset_format();
        controller.get_logger(None).warning("plain");
        assert_eq!(sink.lines()[1], "plain");
    }

    #[test]
    fn test_warning_once_per_logger_and_message() {
        let controller = controller(MapEnv::new());
        let (handler, sink) = Handler::memory();
        controller.add_handler(&handler);

        let logger = controller.get_logger(Some("lib.tokenizers"));
        for _ in 0..5 {
            logger.warning_once("slow tokenizer");
        }
        logger.warning_once("another message");
        controller
            .get_logger(Some("lib.models"))
            .warning_once("slow tokenizer");

        assert_eq!(
            sink.lines(),
            vec![
                "slow tokenizer".to_string(),
                "another message".to_string(),
                "slow tokenizer".to_string(),
            ]
        );
    }

    #[test]
    fn test_info_once_respects_level() {
        let controller = controller(MapEnv::new());
        let (handler, sink) = Handler::memory();
        controller.add_handler(&handler);
        let logger = controller.get_logger(None);

        logger.info_once("first");
        controller.set_verbosity_info();
        logger.info_once("first");
        logger.info_once("second");
        logger.info_once("second");

        assert_eq!(sink.lines(), vec!["second".to_string()]);
    }

    #[test]
    fn test_advisory_warning_toggled_at_call_time() {
        let env = Arc::new(MapEnv::new());
        let controller = VerbosityController::with_library_name(env.clone(), "lib");
        let (handler, sink) = Handler::memory();
        controller.add_handler(&handler);
        let logger = controller.get_logger(None);

        logger.warning_advice("advice one");
        env.set(NO_ADVISORY_WARNINGS_VAR, "1");
        logger.warning_advice("advice two");
        env.set(NO_ADVISORY_WARNINGS_VAR, "");
        logger.warning_advice("advice three");

        assert_eq!(
            sink.lines(),
            vec!["advice one".to_string(), "advice three".to_string()]
        );
    }

    #[test]
    fn test_add_then_remove_handler_restores_state() {
        let controller = controller(MapEnv::new());
        let before = controller.get_logger(None).handlers().len();

        let (handler, sink) = Handler::memory();
        controller.add_handler(&handler);
        controller.remove_handler(&handler);

        assert_eq!(controller.get_logger(None).handlers().len(), before);
        controller.get_logger(None).error("not captured");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_reset_creates_new_default_handler() {
        let controller = controller(MapEnv::new());
        controller.get_logger(None);
        let first = controller.default_handler().unwrap();

        controller.reset();
        assert!(controller.default_handler().is_none());

        controller.get_logger(None);
        let second = controller.default_handler().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(controller.get_logger(None).handlers().len(), 1);
    }

    #[test]
    fn test_buffered_file_handler_sees_each_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.log");
        let file = File::create(&path).unwrap();
        let handler = Arc::new(Handler::new(WriterSink::new(BufWriter::new(file))));

        let controller = controller(MapEnv::new());
        controller.add_handler(&handler);
        controller.get_logger(None).error("emitted");

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "emitted\n");
    }

    #[test]
    fn test_disabled_gate_hands_out_empty_progress() {
        let gate = ProgressGate::new(false);
        let progress = gate.progress(Some(10));
        assert!(progress.is_empty());
        progress.inc(5);
        progress.set_message("ignored");
        progress.finish();
        assert_eq!(progress.position(), None);
        assert!(gate.get_lock().is_none());
    }

    #[test]
    fn test_enabled_gate_tracks_position() {
        let gate = ProgressGate::new(true);
        let progress = gate.progress(Some(4));
        assert!(!progress.is_empty());
        progress.inc(3);
        assert_eq!(progress.position(), Some(3));
        progress.finish();
    }

    #[test]
    fn test_gate_toggle() {
        let gate = ProgressGate::new(true);
        gate.disable();
        assert!(!gate.is_enabled());
        assert!(matches!(gate.progress(None), Progress::Empty(_)));
        gate.enable();
        assert!(gate.is_enabled());
        assert!(matches!(gate.progress(None), Progress::Bar(_)));
    }

    #[test]
    fn test_wrapped_iterator_yields_every_item() {
        for enabled in [true, false] {
            let gate = ProgressGate::new(enabled);
            let total: u32 = gate.wrap(1..=10u32).sum();
            assert_eq!(total, 55);
        }

        let collected: Vec<char> = "abc".chars().with_progress().collect();
        assert_eq!(collected, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_global_controller_round_trip() {
        let previous = transformers_logging::get_verbosity();
        transformers_logging::set_verbosity_debug();
        assert_eq!(transformers_logging::get_verbosity(), Level::Debug);
        transformers_logging::set_verbosity(previous);
        assert_eq!(transformers_logging::get_verbosity(), previous);
    }
}

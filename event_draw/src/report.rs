/// Where the engines send their progress messages and warnings.
///
/// The engines never touch a global logger. The command line uses
/// [LogReporter], tests can collect the messages.
pub trait Reporter {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards all the messages to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        log::info!(target: "event_draw", "{}", message);
    }

    fn warn(&self, message: &str) {
        log::warn!(target: "event_draw", "{}", message);
    }
}

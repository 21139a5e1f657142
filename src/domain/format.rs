use crate::domain::record::LogRecord;

/// Line layout applied by a handler.
///
/// A handler without a formatter renders records with [`Formatter::Implicit`],
/// which is just the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    /// `MESSAGE`
    Implicit,
    /// `[LEVEL|FILE:LINE] TIME >> MESSAGE`
    Explicit,
    /// `[LEVEL|PATH:LINE] TIME >> MESSAGE`, installed for `TRANSFORMERS_VERBOSITY=detail`
    Detail,
}

impl Formatter {
    pub fn format(&self, record: &LogRecord) -> String {
        match self {
            Formatter::Implicit => record.message.clone(),
            Formatter::Explicit => format!(
                "[{}|{}:{}] {} >> {}",
                record.level,
                record.filename(),
                record.lineno,
                record.asctime(),
                record.message
            ),
            Formatter::Detail => format!(
                "[{}|{}:{}] {} >> {}",
                record.level,
                record.pathname,
                record.lineno,
                record.asctime(),
                record.message
            ),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Implicit
    }
}

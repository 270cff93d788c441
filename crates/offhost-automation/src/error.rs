use thiserror::Error;

pub type Result<T, E = AutomationError> = std::result::Result<T, E>;

/// Coarse classification of an [`AutomationError`], independent of any
/// context the error was wrapped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidTimeFormat,
    InvalidSampleIndex,
    DuplicateKeyframeTime,
    ValueOutOfRange,
    InvalidValueType,
    UnknownParameter,
    TextUnsupportedForParameter,
    UnconvertibleText,
    EmptyAutomation,
    MalformedDocument,
    InvalidOverride,
}

/// Errors raised while building or applying parameter automation.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("invalid keyframe time '{expression}': {reason}")]
    InvalidTimeFormat {
        expression: String,
        reason: &'static str,
    },
    #[error("invalid sample index '{expression}'")]
    InvalidSampleIndex { expression: String },
    #[error(
        "duplicate keyframe time {sample} for parameter '{parameter}' (obtained from input string '{expression}')"
    )]
    DuplicateKeyframeTime {
        parameter: String,
        sample: u64,
        expression: String,
    },
    #[error("normalized parameter value must be between 0 and 1, but is {value}")]
    ValueOutOfRange { value: f64 },
    #[error("invalid parameter value type {found}; must be a number or string")]
    InvalidValueType { found: &'static str },
    #[error("unknown parameter identifier '{name}'")]
    UnknownParameter { name: String },
    #[error(
        "text value used for parameter '{parameter}', but parameter only supports normalized values (use a number, or the ':n' suffix on the command line)"
    )]
    TextUnsupportedForParameter { parameter: String },
    #[error("parameter '{parameter}' cannot convert text '{text}' to a value")]
    UnconvertibleText { parameter: String, text: String },
    #[error("automation for parameter '{parameter}' has no keyframes")]
    EmptyAutomation { parameter: String },
    #[error("malformed automation document: {reason}")]
    MalformedDocument { reason: String },
    #[error("malformed automation document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("'{argument}' is not a valid parameter argument: {reason}")]
    InvalidOverride { argument: String, reason: String },
    #[error(
        "parameter '{parameter}'{}: {source}",
        .time.as_ref().map(|time| format!(" at keyframe '{time}'")).unwrap_or_default()
    )]
    InParameter {
        parameter: String,
        time: Option<String>,
        #[source]
        source: Box<AutomationError>,
    },
}

impl AutomationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTimeFormat { .. } => ErrorKind::InvalidTimeFormat,
            Self::InvalidSampleIndex { .. } => ErrorKind::InvalidSampleIndex,
            Self::DuplicateKeyframeTime { .. } => ErrorKind::DuplicateKeyframeTime,
            Self::ValueOutOfRange { .. } => ErrorKind::ValueOutOfRange,
            Self::InvalidValueType { .. } => ErrorKind::InvalidValueType,
            Self::UnknownParameter { .. } => ErrorKind::UnknownParameter,
            Self::TextUnsupportedForParameter { .. } => ErrorKind::TextUnsupportedForParameter,
            Self::UnconvertibleText { .. } => ErrorKind::UnconvertibleText,
            Self::EmptyAutomation { .. } => ErrorKind::EmptyAutomation,
            Self::MalformedDocument { .. } | Self::Json(_) => ErrorKind::MalformedDocument,
            Self::InvalidOverride { .. } => ErrorKind::InvalidOverride,
            Self::InParameter { source, .. } => source.kind(),
        }
    }

    /// Attaches the parameter name, and the keyframe time when there is one.
    pub(crate) fn in_parameter(self, parameter: &str, time: Option<&str>) -> Self {
        Self::InParameter {
            parameter: parameter.to_owned(),
            time: time.map(str::to_owned),
            source: Box::new(self),
        }
    }
}

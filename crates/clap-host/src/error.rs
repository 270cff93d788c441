use thiserror::Error;

/// Errors raised by a running plug-in instance.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("plug-in instance is not activated")]
    NotActivated,
    #[error("plug-in failed to process a block")]
    ProcessFailed,
    #[error("buffer has {actual} channels, but the bus layout needs {expected}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("block of {frames} frames exceeds the buffer size of {capacity}")]
    BlockTooLarge { frames: usize, capacity: usize },
    #[error("unsupported plugin: {0}")]
    Unsupported(String),
}

/// Errors raised while bringing up a plug-in instance.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("plug-in refused to activate")]
    ActivationFailed,
    #[error("plug-in returned null instance")]
    NullInstance,
    #[error("plug-in refused to init")]
    InitFailed,
    #[error("plug-in refused to start processing")]
    StartProcessingFailed,
    #[error("library exposes no plug-in factory")]
    MissingFactory,
    #[error("factory missing create_plugin entry point")]
    MissingCreatePlugin,
    #[error("plug-in id contains a NUL byte")]
    InvalidId,
}

// ── Error types ──
//
// Two error types: `CoreError` is the only error a caller of
// `SoftApLifecycle` can observe; `StartSoftApError` is internal to
// `start_soft_ap` and only ever drives which `FailureReason` gets
// published — it never escapes the crate.

use thiserror::Error;

/// The only error a `SoftApLifecycle` caller can observe: the lifecycle has
/// already reached its terminal quit and its mailbox is closed. Every other
/// failure mode this crate recognizes (bad config, driver errors, channel
/// planning failures) is reported asynchronously through `Observers` and the
/// `Failed` state, not as a `Result::Err` — this
/// core never swallows a transition-causing error silently but also never
/// frames those as synchronous call failures.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("lifecycle has already quit; the event mailbox is closed")]
    Terminated,
}

/// Error kinds recognized by `startSoftAp`. Maps
/// directly onto the `FailureReason` published via `onStateChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartSoftApError {
    #[error("general SoftAP start failure")]
    General,
    #[error("no channel available for the requested configuration")]
    NoChannel,
    #[error("requested configuration is not supported by capability")]
    UnsupportedConfiguration,
}

impl From<StartSoftApError> for crate::event::FailureReason {
    fn from(err: StartSoftApError) -> Self {
        match err {
            StartSoftApError::General => crate::event::FailureReason::General,
            StartSoftApError::NoChannel => crate::event::FailureReason::NoChannel,
            StartSoftApError::UnsupportedConfiguration => {
                crate::event::FailureReason::UnsupportedConfiguration
            }
        }
    }
}

/// Result of `ChannelPlanner::update_band_and_channel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelPlanError {
    #[error("no channel available")]
    NoChannel,
    #[error("requested configuration is not supported")]
    UnsupportedConfiguration,
    #[error("general channel planning failure")]
    General,
}

impl From<ChannelPlanError> for StartSoftApError {
    fn from(err: ChannelPlanError) -> Self {
        match err {
            ChannelPlanError::NoChannel => StartSoftApError::NoChannel,
            ChannelPlanError::UnsupportedConfiguration => {
                StartSoftApError::UnsupportedConfiguration
            }
            ChannelPlanError::General => StartSoftApError::General,
        }
    }
}

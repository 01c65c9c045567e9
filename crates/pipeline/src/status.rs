//! Pipeline phases and the status-token to control-state mapping

/// Phase of the upload/generate pipeline, in flow order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelinePhase {
    #[default]
    Idle,
    Uploading,
    Ready,
    Submitting,
    Queued,
    Processing {
        polls: u32,
    },
    Downloading,
    Complete,
    Error,
}

impl PipelinePhase {
    /// Status token shown while this phase is active.
    pub fn token(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Uploading => Some("UPLOADING...".to_string()),
            Self::Ready => Some("READY".to_string()),
            Self::Submitting => Some("SUBMITTING JOB...".to_string()),
            Self::Queued => Some("JOB QUEUED...".to_string()),
            Self::Processing { polls } => Some(format!("PROCESSING... ({})", polls)),
            Self::Downloading => Some("Downloading...".to_string()),
            Self::Complete => Some("COMPLETE".to_string()),
            Self::Error => Some("ERROR".to_string()),
        }
    }

    /// Phases during which new uploads, generations, and downloads are
    /// rejected.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Uploading
                | Self::Submitting
                | Self::Queued
                | Self::Processing { .. }
                | Self::Downloading
        )
    }
}

/// Generate-control state derived from a status token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
    pub label: String,
}

/// Map a status token to the generate control.
///
/// Tokens containing `PROCESSING`, `UPLOADING`, or `SUBMITTING` disable the
/// control and echo the token; the fixed tokens re-enable it with a fixed
/// label. `None` leaves the control unchanged, which is what happens for
/// tokens like `JOB QUEUED...`.
pub fn control_state(token: &str) -> Option<ControlState> {
    if token.contains("PROCESSING") || token.contains("UPLOADING") || token.contains("SUBMITTING") {
        return Some(ControlState {
            enabled: false,
            label: token.to_string(),
        });
    }
    match token {
        "READY" => Some(ControlState {
            enabled: true,
            label: "Generate".to_string(),
        }),
        "COMPLETE" => Some(ControlState {
            enabled: true,
            label: "Generate Again".to_string(),
        }),
        "ERROR" => Some(ControlState {
            enabled: true,
            label: "Try Again".to_string(),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_tokens_disable_and_echo() {
        for token in ["UPLOADING...", "SUBMITTING JOB...", "PROCESSING... (7)"] {
            let state = control_state(token).expect("busy tokens map");
            assert!(!state.enabled);
            assert_eq!(state.label, token);
        }
    }

    #[test]
    fn test_fixed_tokens_reenable_with_fixed_labels() {
        assert_eq!(
            control_state("READY"),
            Some(ControlState {
                enabled: true,
                label: "Generate".to_string()
            })
        );
        assert_eq!(
            control_state("COMPLETE"),
            Some(ControlState {
                enabled: true,
                label: "Generate Again".to_string()
            })
        );
        assert_eq!(
            control_state("ERROR"),
            Some(ControlState {
                enabled: true,
                label: "Try Again".to_string()
            })
        );
    }

    #[test]
    fn test_unmatched_tokens_leave_control_unchanged() {
        assert_eq!(control_state("JOB QUEUED..."), None);
        assert_eq!(control_state("Downloading..."), None);
        assert_eq!(control_state(""), None);
    }

    #[test]
    fn test_phase_tokens() {
        assert_eq!(PipelinePhase::Idle.token(), None);
        assert_eq!(
            PipelinePhase::Processing { polls: 3 }.token().unwrap(),
            "PROCESSING... (3)"
        );
        assert_eq!(PipelinePhase::Queued.token().unwrap(), "JOB QUEUED...");
    }

    #[test]
    fn test_busy_phases() {
        assert!(PipelinePhase::Uploading.is_busy());
        assert!(PipelinePhase::Processing { polls: 1 }.is_busy());
        assert!(PipelinePhase::Downloading.is_busy());
        assert!(!PipelinePhase::Ready.is_busy());
        assert!(!PipelinePhase::Complete.is_busy());
        assert!(!PipelinePhase::Error.is_busy());
    }
}

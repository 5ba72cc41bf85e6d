// Pipeline error taxonomy. Collaborator failures travel as anyhow::Error around these.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Audit result is missing a category, score or audit entry the snapshot needs.
    #[error("malformed audit result: missing {0}")]
    MalformedAudit(String),

    #[error("unparseable duration {0:?}")]
    UnparseableDuration(String),

    #[error("unknown metric set {0:?}")]
    UnknownMetricSet(String),

    /// No stored row carries the metric set's fields, so no average exists.
    #[error("no {metric_set} history for component {component:?}")]
    EmptyHistory {
        component: String,
        metric_set: String,
    },

    #[error("corrupt history row {row_id}: {reason}")]
    CorruptRow { row_id: i64, reason: String },
}

/// Fold a cleanup step (closing a browser or session) into the result of the work before it.
/// A cleanup failure is returned when the work succeeded; after a work failure it is logged
/// and the work error wins.
pub fn with_cleanup<T>(
    result: anyhow::Result<T>,
    cleanup: anyhow::Result<()>,
    operation: &'static str,
) -> anyhow::Result<T> {
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.context(format!("{operation} failed"))),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            tracing::warn!(
                error = %cleanup_err,
                operation,
                "cleanup failed after earlier error"
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_error_surfaces_after_success() {
        let err = with_cleanup(Ok(7), Err(anyhow::anyhow!("socket gone")), "browser close")
            .unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("browser close failed"));
        assert!(chain.contains("socket gone"));
    }

    #[test]
    fn earlier_error_wins_over_cleanup_error() {
        let err = with_cleanup::<()>(
            Err(anyhow::anyhow!("draw failed")),
            Err(anyhow::anyhow!("socket gone")),
            "browser close",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "draw failed");
    }

    #[test]
    fn clean_paths_pass_through() {
        assert_eq!(with_cleanup(Ok(7), Ok(()), "browser close").unwrap(), 7);
        let err = with_cleanup::<()>(Err(anyhow::anyhow!("open failed")), Ok(()), "browser close")
            .unwrap_err();
        assert_eq!(err.to_string(), "open failed");
    }
}

//! Request verdict aggregation.
//!
//! A request is malicious when at least `threshold` packets were flagged by
//! the DFA, or when the evaluator flagged the request itself.
//!
//! Per-packet flags follow the submitted packet list. Packets the evaluator
//! returned no result for count as not flagged.

use shared_types::{RequestResult, RequestVerdict};

/// Thresholds below one are clamped: zero detections never flag a request.
pub fn effective_threshold(threshold: i64) -> i64 {
    threshold.max(1)
}

pub fn aggregate_verdict(
    result: &RequestResult,
    packet_count: usize,
    threshold: i64,
) -> RequestVerdict {
    let threshold = effective_threshold(threshold);
    let suspicious: Vec<bool> = (0..packet_count)
        .map(|i| result.packets.get(i).is_some_and(|p| p.is_malicious))
        .collect();
    let detections = suspicious.iter().filter(|flag| **flag).count();
    let threshold_exceeded = detections as i64 >= threshold;
    let backend_flag = result.is_malicious.unwrap_or(false);

    RequestVerdict {
        detections,
        threshold,
        threshold_exceeded,
        backend_flag,
        is_malicious: threshold_exceeded || backend_flag,
        suspicious,
        pda_valid: result.pda.is_valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{DfaResult, PdaResult};

    fn result_with_flags(flags: &[bool], backend: Option<bool>) -> RequestResult {
        RequestResult {
            pda: PdaResult {
                is_valid: true,
                trace: vec![],
            },
            packets: flags
                .iter()
                .map(|flag| DfaResult {
                    steps: vec![],
                    final_state: "s0".to_string(),
                    is_malicious: *flag,
                    label: String::new(),
                })
                .collect(),
            is_malicious: backend,
        }
    }

    #[test]
    fn test_threshold_met_flags_request() {
        let verdict = aggregate_verdict(&result_with_flags(&[true, false, true], None), 3, 2);
        assert_eq!(verdict.detections, 2);
        assert!(verdict.threshold_exceeded);
        assert!(verdict.is_malicious);
        assert_eq!(verdict.suspicious, vec![true, false, true]);
    }

    #[test]
    fn test_threshold_not_met_is_benign() {
        let verdict = aggregate_verdict(&result_with_flags(&[true, false, true], None), 3, 3);
        assert!(!verdict.threshold_exceeded);
        assert!(!verdict.is_malicious);
    }

    #[test]
    fn test_backend_flag_overrides_threshold() {
        let verdict = aggregate_verdict(&result_with_flags(&[false, false], Some(true)), 2, 5);
        assert!(!verdict.threshold_exceeded);
        assert!(verdict.backend_flag);
        assert!(verdict.is_malicious);
    }

    #[test]
    fn test_non_positive_threshold_clamped_to_one() {
        let clean = aggregate_verdict(&result_with_flags(&[false, false], None), 2, 0);
        assert_eq!(clean.threshold, 1);
        assert!(!clean.is_malicious);

        let flagged = aggregate_verdict(&result_with_flags(&[false, true], None), 2, -4);
        assert_eq!(flagged.threshold, 1);
        assert!(flagged.is_malicious);
    }

    #[test]
    fn test_flags_follow_submitted_packets() {
        let short = aggregate_verdict(&result_with_flags(&[true], None), 3, 1);
        assert_eq!(short.suspicious, vec![true, false, false]);
        assert_eq!(short.detections, 1);

        let long = aggregate_verdict(&result_with_flags(&[false, true, true], None), 1, 1);
        assert_eq!(long.suspicious, vec![false]);
        assert_eq!(long.detections, 0);
        assert!(!long.is_malicious);
    }

    #[test]
    fn test_empty_request_is_benign() {
        let verdict = aggregate_verdict(&result_with_flags(&[], Some(false)), 0, 1);
        assert_eq!(verdict.detections, 0);
        assert!(!verdict.is_malicious);
        assert!(verdict.pda_valid);
    }
}

//! 双流合并：把单条原始事件折叠进既有快照
//!
//! 运动流与姿态流更新互不重叠的字段集。样本中缺失的字段保留
//! 上一次的值，快照时间戳取合并时刻且单调不减。

use crate::types::{MotionSample, OrientationSample, RawEvent, Reading};

/// 将一条事件折叠进 prev，返回新的快照
pub(crate) fn fold(prev: Reading, event: &RawEvent, now_ms: i64) -> Reading {
    let mut next = match event {
        RawEvent::Motion(sample) => fold_motion(prev, sample),
        RawEvent::Orientation(sample) => fold_orientation(prev, sample),
    };
    next.timestamp = now_ms.max(prev.timestamp);
    next
}

fn fold_motion(prev: Reading, sample: &MotionSample) -> Reading {
    Reading {
        x: sample.x.or(prev.x),
        y: sample.y.or(prev.y),
        z: sample.z.or(prev.z),
        ..prev
    }
}

fn fold_orientation(prev: Reading, sample: &OrientationSample) -> Reading {
    Reading {
        alpha: sample.alpha.or(prev.alpha),
        beta: sample.beta.or(prev.beta),
        gamma: sample.gamma.or(prev.gamma),
        ..prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_event_fills_motion_fields_only() {
        let prev = Reading::default();
        let event = RawEvent::Motion(MotionSample::new(1.23, 4.56, 7.89, 1));
        let next = fold(prev, &event, 1000);

        assert_eq!(next.x, Some(1.23));
        assert_eq!(next.y, Some(4.56));
        assert_eq!(next.z, Some(7.89));
        assert_eq!(next.alpha, None);
        assert_eq!(next.beta, None);
        assert_eq!(next.gamma, None);
        assert_eq!(next.timestamp, 1000);
    }

    #[test]
    fn orientation_event_preserves_prior_motion_fields() {
        let prev = fold(
            Reading::default(),
            &RawEvent::Motion(MotionSample::new(1.23, 4.56, 7.89, 1)),
            1000,
        );
        let next = fold(
            prev,
            &RawEvent::Orientation(OrientationSample::new(90.0, 45.0, -30.0, 2)),
            1100,
        );

        assert_eq!(next.x, Some(1.23));
        assert_eq!(next.y, Some(4.56));
        assert_eq!(next.z, Some(7.89));
        assert_eq!(next.alpha, Some(90.0));
        assert_eq!(next.beta, Some(45.0));
        assert_eq!(next.gamma, Some(-30.0));
        assert_eq!(next.timestamp, 1100);
    }

    #[test]
    fn missing_axes_keep_last_known_values() {
        let prev = fold(
            Reading::default(),
            &RawEvent::Motion(MotionSample::new(1.0, 2.0, 3.0, 1)),
            100,
        );
        let partial = MotionSample {
            x: Some(9.0),
            y: None,
            z: None,
            timestamp: 2,
        };
        let next = fold(prev, &RawEvent::Motion(partial), 200);

        assert_eq!(next.x, Some(9.0));
        assert_eq!(next.y, Some(2.0));
        assert_eq!(next.z, Some(3.0));
    }

    #[test]
    fn motion_only_stream_never_touches_orientation() {
        let mut reading = Reading::default();
        for i in 0..20 {
            let event = RawEvent::Motion(MotionSample::new(i as f64, 0.0, 0.0, i));
            reading = fold(reading, &event, 100 + i);
        }
        assert_eq!(reading.alpha, None);
        assert_eq!(reading.beta, None);
        assert_eq!(reading.gamma, None);
        assert_eq!(reading.x, Some(19.0));
    }

    #[test]
    fn timestamp_never_decreases() {
        let prev = fold(
            Reading::default(),
            &RawEvent::Motion(MotionSample::new(1.0, 0.0, 0.0, 1)),
            500,
        );
        // 时钟回拨时保持上一次的时间戳
        let next = fold(prev, &RawEvent::Motion(MotionSample::new(2.0, 0.0, 0.0, 2)), 400);
        assert_eq!(next.timestamp, 500);
        assert_eq!(next.x, Some(2.0));
    }
}

//! Property tests for plan partitioning and the render loop.

use corte_core::{AudioFormat, FrameCount, PcmBuffer};
use corte_render::{
    FrameSink, GraphBuilder, Result, SegmentPlan, SegmentRenderer, VolumeAutomation, VolumeMarker,
    VolumeSegment,
};
use proptest::prelude::*;

struct CountingSink {
    append_sizes: Vec<usize>,
}

impl FrameSink for CountingSink {
    fn append(&mut self, buffer: &PcmBuffer) -> Result<()> {
        self.append_sizes.push(buffer.frame_len());
        Ok(())
    }
}

proptest! {
    /// The interval plan's pieces partition the requested range exactly:
    /// frame counts telescope, so their sum equals the whole range's count.
    #[test]
    fn interval_plan_partitions_the_frame_range(
        sample_rate in 8000.0f64..192_000.0,
        from in 0.0f64..100.0,
        span in 0.0f64..100.0,
        segment_length in 0.1f64..20.0,
    ) {
        let format = AudioFormat::new(sample_rate, 1).unwrap();
        let to = from + span;
        let plan = SegmentPlan::Interval { from_secs: from, to_secs: to, segment_length };
        let intervals = plan.intervals().unwrap();

        let piecewise: u64 = intervals
            .iter()
            .map(|&(s, e)| format.frames_in(s, e))
            .sum();
        prop_assert_eq!(piecewise, format.frames_in(from, to));

        // Pieces are contiguous and ordered.
        for pair in intervals.windows(2) {
            prop_assert_eq!(pair[0].1, pair[1].0);
        }
        if let (Some(first), Some(last)) = (intervals.first(), intervals.last()) {
            prop_assert_eq!(first.0, from);
            prop_assert_eq!(last.1, to);
        }
    }

    /// The render loop produces exactly the target, never overshoots, and
    /// never exceeds the per-pull maximum.
    #[test]
    fn render_loop_never_overshoots(
        scheduled in 1usize..4000,
        max_frames in 1usize..512,
    ) {
        let format = AudioFormat::new(48_000.0, 1).unwrap();
        let mut graph = GraphBuilder::new(format).build();
        graph.enable_offline_mode(format, max_frames).unwrap();
        graph.start().unwrap();

        let mut buffer = PcmBuffer::allocate(format, scheduled).unwrap();
        buffer.set_frame_len(scheduled);
        let ticket = graph.schedule_buffer(buffer).unwrap();
        let target = ticket.frames();

        let mut sink = CountingSink { append_sizes: Vec::new() };
        let rendered = SegmentRenderer::new()
            .render(&mut graph, &mut sink, target)
            .unwrap();

        prop_assert_eq!(rendered, target);
        prop_assert_eq!(
            sink.append_sizes.iter().map(|&n| n as FrameCount).sum::<FrameCount>(),
            target
        );
        prop_assert!(sink.append_sizes.iter().all(|&n| n <= max_frames));
    }

    /// Automation gain stays within the unit interval everywhere.
    #[test]
    fn automation_gain_stays_in_unit_interval(
        t0 in 0.0f64..10.0,
        len in 0.01f64..10.0,
        g0 in 0.0f32..=1.0,
        g1 in 0.0f32..=1.0,
        probe in -5.0f64..30.0,
    ) {
        let automation = VolumeAutomation::new(vec![VolumeSegment {
            start: VolumeMarker { time_secs: t0, gain: g0 },
            end: VolumeMarker { time_secs: t0 + len, gain: g1 },
        }])
        .unwrap();
        let gain = automation.gain_at(probe);
        prop_assert!((0.0..=1.0).contains(&gain));
    }
}

//! Line-by-line conversion pipeline

use crate::{
    config::ConvertConfig,
    gcode::{ConvertError, Diagnostic, Line, LineDiagnostic, Marker},
    machine::{Accumulator, Flush, ParserState, Reason},
    render::Render,
};
use std::{borrow::Cow, io::BufRead};
use tracing::{debug, trace, warn};

/// Counters of one conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub lines: u64,
    pub moves: u64,
    pub segments: u64,
    pub dropped: u64,
    pub diagnostics: u64,
}

/// Converter state for one input stream
pub struct Converter<'r> {
    cfg: ConvertConfig,
    state: ParserState,
    acc: Accumulator,
    render: &'r mut dyn Render,
    summary: Summary,
}

impl<'r> Converter<'r> {
    pub fn new(cfg: ConvertConfig, render: &'r mut dyn Render) -> Self {
        Self {
            cfg,
            state: ParserState::default(),
            acc: Accumulator::new(cfg.extrusion_rate),
            render,
            summary: Summary::default(),
        }
    }

    /// Process one source line, `n` is 1-based
    pub fn line(&mut self, n: u64, text: &str) -> Result<(), ConvertError> {
        self.summary.lines += 1;

        if self.cfg.debug {
            if self.cfg.line_numbers {
                self.render.comment(&format!("{n}: {text}"))?;
            } else {
                self.render.comment(text)?;
            }
        }

        if let Some(marker) = Marker::classify(text) {
            trace!(line = n, ?marker, "marker");
            if let Marker::Type { label, code: "" } = &marker {
                debug!(line = n, %label, "feature type has no short code");
            }
            self.acc.mark(&marker);
            return self.flush();
        }

        if let Line::Motion(words) = Line::parse(text) {
            let (fields, diagnostics) = words.fields();
            for d in diagnostics {
                self.diagnose(d.at_line(n))?;
            }
            if let Some(c) = &fields.comment {
                trace!(line = n, comment = %c, "move comment");
            }

            let wp = self.state.track(&fields);
            self.acc.push(&wp);
            self.summary.moves += 1;
        }

        Ok(())
    }

    /// Input ended without being finished: behave as if `M84` followed
    pub fn finish(mut self) -> Result<Summary, ConvertError> {
        if !self.acc.is_finished() {
            self.acc.mark(&Marker::End);
            self.flush()?;
        }
        Ok(self.summary)
    }

    pub fn is_finished(&self) -> bool {
        self.acc.is_finished()
    }

    /// Report a non-fatal problem as a script comment
    pub fn diagnose(&mut self, d: LineDiagnostic) -> Result<(), ConvertError> {
        warn!("{d}");
        self.render.comment(&d.to_string())?;
        self.summary.diagnostics += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ConvertError> {
        match self.acc.flush(&self.state) {
            Flush::Idle | Flush::Empty => {}
            Flush::Suppressed { reason, moves } => {
                if reason == Reason::Final && moves > 0 {
                    debug!(moves, "unlabeled trailing segment dropped");
                    self.summary.dropped += 1;
                } else {
                    trace!(%reason, "flush suppressed for unlabeled segment");
                }
            }
            Flush::Emitted(segment) => {
                debug!(
                    label = %segment.label,
                    points = segment.buffers.len(),
                    "segment flushed"
                );
                self.render.segment(&segment)?;
                self.summary.segments += 1;
            }
        }
        Ok(())
    }
}

/// Convert a whole stream; stops after the end-of-program marker
///
/// Lines that are not valid UTF-8 are decoded lossily and reported.
pub fn convert(
    mut input: impl BufRead,
    render: &mut dyn Render,
    cfg: ConvertConfig,
) -> Result<Summary, ConvertError> {
    let mut conv = Converter::new(cfg, render);
    let mut buf = Vec::new();
    let mut n = 0;

    loop {
        buf.clear();
        let read = input
            .read_until(b'\n', &mut buf)
            .map_err(|source| ConvertError::Read { line: n + 1, source })?;
        if read == 0 {
            break;
        }
        n += 1;

        let text = String::from_utf8_lossy(strip_eol(&buf));
        conv.line(n, &text)?;
        if let Cow::Owned(_) = text {
            conv.diagnose(Diagnostic::InvalidUtf8.at_line(n))?;
        }
        if conv.is_finished() {
            break;
        }
    }

    conv.finish()
}

/// Drop a trailing `\n` or `\r\n`
fn strip_eol(line: &[u8]) -> &[u8] {
    match line.strip_suffix(b"\n") {
        Some(l) => l.strip_suffix(b"\r").unwrap_or(l),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::{convert, Summary};
    use crate::{config::ConvertConfig, render::Script};

    const SCENARIO: &str = "\
;LAYER:0
;TYPE:FILL
G1 X10 Y0 Z0.2 E1 F1200
G1 X20 Y0 Z0.2 E2 F1200
M84
";

    fn run(input: &str, cfg: ConvertConfig) -> (String, Summary) {
        let mut script = Script::new(Vec::new());
        let summary = convert(input.as_bytes(), &mut script, cfg).unwrap();
        (String::from_utf8(script.into_inner()).unwrap(), summary)
    }

    fn array<'a>(out: &'a str, name: &str) -> Vec<&'a str> {
        let prefix = format!("{name}=[");
        let line = out
            .lines()
            .find(|l| l.starts_with(&prefix))
            .unwrap_or_else(|| panic!("no array {name} in\n{out}"));
        line[prefix.len()..line.len() - 2].split(' ').collect()
    }

    #[test]
    fn scenario_single_fill_segment() {
        let (out, summary) = run(SCENARIO, ConvertConfig::default());

        assert_eq!(summary.segments, 1);
        assert_eq!(summary.moves, 2);
        assert_eq!(array(&out, "x0fi"), ["0.000", "10.000", "20.000"]);
        assert_eq!(array(&out, "y0fi"), ["0.000", "0.000", "0.000"]);
        assert_eq!(array(&out, "z0fi"), ["0.000", "0.200", "0.200"]);
        // first move also climbs 0.2 in z
        assert_eq!(array(&out, "d0fi"), ["0.000", "10.002", "10.000"]);
        assert_eq!(array(&out, "e0fi"), ["0.000", "1.000", "2.000"]);
        assert_eq!(array(&out, "f0fi"), ["-1.000", "1200.000", "1200.000"]);
        assert_eq!(
            out.lines().last(),
            Some("plot3(x0fi,y0fi,z0fi,'linewidth',1);")
        );
        assert_eq!(out.matches("plot3(").count(), 1);
    }

    #[test]
    fn scenario_extrusion_rate() {
        let cfg = ConvertConfig {
            extrusion_rate: true,
            ..ConvertConfig::default()
        };
        let (out, _) = run(SCENARIO, cfg);
        assert_eq!(array(&out, "e0fi"), ["0.000", "0.100", "0.100"]);
    }

    #[test]
    fn scenario_unknown_tag() {
        let input = "\
;LAYER:0
;TYPE:FILL
G1 X10 Y5 Z0.2 Q5 E1 F900
M84
";
        let (out, summary) = run(input, ConvertConfig::default());
        assert_eq!(summary.diagnostics, 1);
        assert!(out.contains("% warning: line 3: unrecognized field tag 'Q'"));
        assert_eq!(array(&out, "x0fi"), ["0.000", "10.000"]);
        assert_eq!(array(&out, "y0fi"), ["0.000", "5.000"]);
        assert_eq!(array(&out, "z0fi"), ["0.000", "0.200"]);
        assert_eq!(array(&out, "e0fi"), ["0.000", "1.000"]);
        assert_eq!(array(&out, "f0fi"), ["-1.000", "900.000"]);
    }

    #[test]
    fn malformed_value_keeps_sticky_field() {
        let input = "\
;LAYER:0
;TYPE:SKIRT
G1 X10 F600
G1 Xoops Y3
M84
";
        let (out, summary) = run(input, ConvertConfig::default());
        assert_eq!(summary.diagnostics, 1);
        assert!(out.contains("malformed value 'oops' for field 'X'"));
        assert_eq!(array(&out, "x0st"), ["0.000", "10.000", "10.000"]);
        assert_eq!(array(&out, "y0st"), ["0.000", "0.000", "3.000"]);
    }

    #[test]
    fn feed_rate_is_sticky() {
        let input = "\
;LAYER:0
;TYPE:WALL-OUTER
G1 X1 F1500
G1 X2
G0 X3 F9000
G1 X4
M84
";
        let (out, _) = run(input, ConvertConfig::default());
        assert_eq!(
            array(&out, "f0wo"),
            ["-1.000", "1500.000", "1500.000", "9000.000", "9000.000"]
        );
    }

    #[test]
    fn segments_reseed_from_previous_end() {
        let input = "\
;LAYER:0
;TYPE:WALL-OUTER
G1 X10 Y10 E1 F1200
;TYPE:WALL-INNER
G1 X20 Y10 E2
;LAYER:1
G0 Z0.4
;TYPE:FILL
G1 X0 E4
M84
";
        let cfg = ConvertConfig {
            extrusion_rate: true,
            ..ConvertConfig::default()
        };
        let (out, summary) = run(input, cfg);
        assert_eq!(summary.segments, 4);

        // each reopened segment starts at the last point with d=0, f=-1, e=0
        assert_eq!(array(&out, "x0wi"), ["10.000", "20.000"]);
        assert_eq!(array(&out, "d0wi"), ["0.000", "10.000"]);
        assert_eq!(array(&out, "f0wi"), ["-1.000", "1200.000"]);
        assert_eq!(array(&out, "e0wi"), ["0.000", "0.100"]);

        // moves between LAYER:1 and TYPE:FILL keep the previous type
        assert_eq!(array(&out, "x1wi"), ["20.000", "20.000"]);
        assert_eq!(array(&out, "d1wi"), ["0.000", "0.400"]);
        assert_eq!(array(&out, "e1wi"), ["0.000", "0.000"]);
        assert_eq!(array(&out, "x1fi"), ["20.000", "0.000"]);
        assert_eq!(array(&out, "d1fi"), ["0.000", "20.000"]);
        assert_eq!(array(&out, "e1fi"), ["0.000", "0.100"]);
    }

    #[test]
    fn unlabeled_type_change_is_not_flushed() {
        let input = "\
;LAYER:0
;TYPE:FILL
G1 X1 F100
;LAYER:2
;TYPE:SUPPORT
G1 X2
;TYPE:SKIN
G1 X3
M84
";
        let (out, summary) = run(input, ConvertConfig::default());
        assert_eq!(summary.segments, 2);
        assert_eq!(array(&out, "x0fi"), ["0.000", "1.000"]);
        // SUPPORT moves are folded into the segment closed after SKIN
        assert_eq!(array(&out, "x2sn"), ["1.000", "2.000", "3.000"]);
        assert!(!out.contains("x2=["));
    }

    #[test]
    fn unlabeled_type_change_on_layer_zero_is_flushed() {
        let input = "\
;LAYER:0
;TYPE:SUPPORT
G1 X2 F100
;TYPE:FILL
G1 X3
M84
";
        let (out, summary) = run(input, ConvertConfig::default());
        assert_eq!(summary.segments, 2);
        assert_eq!(array(&out, "x0"), ["0.000", "2.000"]);
        assert_eq!(array(&out, "x0fi"), ["2.000", "3.000"]);
    }

    #[test]
    fn trailing_unlabeled_segment_is_dropped() {
        // known quirk, kept on purpose
        let input = "\
;LAYER:0
;TYPE:FILL
G1 X1 F100
;LAYER:3
;TYPE:SUPPORT
G1 X5
M84
";
        let (out, summary) = run(input, ConvertConfig::default());
        assert_eq!(summary.segments, 1);
        assert_eq!(summary.dropped, 1);
        assert!(!out.contains("5.000"));
    }

    #[test]
    fn end_of_input_acts_as_final_marker() {
        let input = SCENARIO.replace("M84\n", "");
        let (out, summary) = run(&input, ConvertConfig::default());
        assert_eq!(summary.segments, 1);
        assert_eq!(array(&out, "x0fi"), ["0.000", "10.000", "20.000"]);
    }

    #[test]
    fn nothing_after_end_of_program() {
        let input = format!("{SCENARIO};LAYER:1\n;TYPE:SKIN\nG1 X99\n");
        let (out, summary) = run(&input, ConvertConfig::default());
        assert_eq!(summary.lines, 5);
        assert_eq!(summary.segments, 1);
        assert!(!out.contains("99"));
    }

    #[test]
    fn latin1_comment_does_not_stop_conversion() {
        let input: &[u8] = b";LAYER:0\n;TYPE:FILL\nG1 X10 F100\n; nozzle 210\xb0C\nG1 X20\nM84\n";
        let mut script = Script::new(Vec::new());
        let summary = convert(input, &mut script, ConvertConfig::default()).unwrap();
        let out = String::from_utf8(script.into_inner()).unwrap();

        assert_eq!(summary.lines, 6);
        assert_eq!(summary.segments, 1);
        assert_eq!(summary.diagnostics, 1);
        assert!(out.contains("% warning: line 4: line is not valid UTF-8"));
        assert_eq!(array(&out, "x0fi"), ["0.000", "10.000", "20.000"]);
    }

    #[test]
    fn crlf_line_endings() {
        let (out, summary) = run(&SCENARIO.replace('\n', "\r\n"), ConvertConfig::default());
        assert_eq!(summary.segments, 1);
        assert_eq!(summary.diagnostics, 0);
        assert_eq!(array(&out, "x0fi"), ["0.000", "10.000", "20.000"]);
    }

    #[test]
    fn tiny_negative_values_print_as_zero() {
        let input = "\
;LAYER:0
;TYPE:FILL
G1 X10 Y-0.0001 F100
M84
";
        let (out, _) = run(input, ConvertConfig::default());
        assert_eq!(array(&out, "y0fi"), ["0.000", "0.000"]);
    }

    #[test]
    fn debug_annotations() {
        let cfg = ConvertConfig {
            debug: true,
            ..ConvertConfig::default()
        };
        let (out, _) = run(SCENARIO, cfg);
        let comments: Vec<_> = out.lines().filter(|l| l.starts_with('%')).collect();
        assert_eq!(
            comments,
            [
                "% ;LAYER:0",
                "% ;TYPE:FILL",
                "% G1 X10 Y0 Z0.2 E1 F1200",
                "% G1 X20 Y0 Z0.2 E2 F1200",
                "% M84",
            ]
        );
        // the comment of the closing marker precedes the flushed arrays
        assert!(out.find("% M84").unwrap() < out.find("x0fi=").unwrap());
    }

    #[test]
    fn numbered_debug_annotations() {
        let cfg = ConvertConfig {
            debug: true,
            line_numbers: true,
            ..ConvertConfig::default()
        };
        let (out, _) = run(SCENARIO, cfg);
        assert!(out.contains("% 1: ;LAYER:0\n"));
        assert!(out.contains("% 5: M84\n"));
    }

    #[test]
    fn line_numbers_need_debug() {
        let cfg = ConvertConfig {
            line_numbers: true,
            ..ConvertConfig::default()
        };
        let (out, _) = run(SCENARIO, cfg);
        assert!(!out.contains('%'));
    }

    #[test]
    fn output_is_deterministic() {
        let cfg = ConvertConfig {
            debug: true,
            line_numbers: true,
            extrusion_rate: true,
        };
        assert_eq!(run(SCENARIO, cfg).0, run(SCENARIO, cfg).0);
    }

    #[test]
    fn rate_is_zero_without_distance() {
        let input = "\
;LAYER:0
;TYPE:FILL
G1 X5 E1 F100
G1 E0.2
G1 E1
M84
";
        let cfg = ConvertConfig {
            extrusion_rate: true,
            ..ConvertConfig::default()
        };
        let (out, _) = run(input, cfg);
        assert_eq!(array(&out, "d0fi"), ["0.000", "5.000", "0.000", "0.000"]);
        assert_eq!(array(&out, "e0fi"), ["0.000", "0.200", "0.000", "0.000"]);
    }
}

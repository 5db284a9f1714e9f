use std::io::BufRead;
use std::sync::Arc;
use std::thread::JoinHandle;

use super::atomic_blur_control::AtomicBlurControl;
use super::atomic_stop_signal::AtomicStopSignal;

/// Kernel sizes move in steps of two so the slider stays on odd values.
pub const STRENGTH_STEP: i64 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    SetStrength(i64),
    Increase,
    Decrease,
    Quit,
}

/// Parses one line of terminal input.
///
/// Accepts an integer strength, `+`/`-` to step, and `q`/`quit` to stop.
pub fn parse_command(line: &str) -> Option<ControlCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "+" => Some(ControlCommand::Increase),
        "-" => Some(ControlCommand::Decrease),
        "q" | "quit" => Some(ControlCommand::Quit),
        other => other.parse().ok().map(ControlCommand::SetStrength),
    }
}

/// Terminal stand-in for the demo's slider and quit key.
///
/// A background thread reads commands line by line and writes them into the
/// shared control and stop flag; the frame loop only ever reads those.
pub struct StdinControlSurface;

impl StdinControlSurface {
    /// Starts the reader thread. It is detached in practice: it ends when
    /// stdin closes or after a quit command.
    pub fn spawn(control: Arc<AtomicBlurControl>, stop: Arc<AtomicStopSignal>) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            run_control_loop(stdin.lock(), &control, &stop);
        })
    }
}

/// Applies commands from `input` until EOF or `quit`.
pub fn run_control_loop<R: BufRead>(input: R, control: &AtomicBlurControl, stop: &AtomicStopSignal) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Control input unreadable, ignoring further input: {e}");
                return;
            }
        };
        match parse_command(&line) {
            Some(ControlCommand::SetStrength(value)) => {
                let stored = control.set(value);
                log::info!("Blur strength set to {stored}");
            }
            Some(ControlCommand::Increase) => {
                log::info!("Blur strength set to {}", control.step(STRENGTH_STEP));
            }
            Some(ControlCommand::Decrease) => {
                log::info!("Blur strength set to {}", control.step(-STRENGTH_STEP));
            }
            Some(ControlCommand::Quit) => {
                log::info!("Stop requested");
                stop.request_stop();
                return;
            }
            None if line.trim().is_empty() => {}
            None => log::warn!("Unrecognized control input: {:?}", line.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::domain::blur_control::BlurControl;
    use crate::control::domain::stop_signal::StopSignal;
    use rstest::rstest;
    use std::io::Cursor;

    #[rstest]
    #[case("+", Some(ControlCommand::Increase))]
    #[case(" - ", Some(ControlCommand::Decrease))]
    #[case("q", Some(ControlCommand::Quit))]
    #[case("QUIT", Some(ControlCommand::Quit))]
    #[case("41", Some(ControlCommand::SetStrength(41)))]
    #[case("-4", Some(ControlCommand::SetStrength(-4)))]
    #[case("", None)]
    #[case("blur", None)]
    #[case("4.5", None)]
    fn test_parse_command(#[case] line: &str, #[case] expected: Option<ControlCommand>) {
        assert_eq!(parse_command(line), expected);
    }

    #[test]
    fn test_control_loop_applies_commands_in_order() {
        let control = AtomicBlurControl::new(35, 5, 99);
        let stop = AtomicStopSignal::new();
        let input = Cursor::new("51\n+\n+\n-\nnonsense\n");

        run_control_loop(input, &control, &stop);

        assert_eq!(control.current_strength(), 53);
        assert!(!stop.should_stop());
    }

    #[test]
    fn test_control_loop_stops_at_quit() {
        let control = AtomicBlurControl::new(35, 5, 99);
        let stop = AtomicStopSignal::new();
        let input = Cursor::new("11\nq\n77\n");

        run_control_loop(input, &control, &stop);

        assert!(stop.should_stop());
        assert_eq!(control.current_strength(), 11);
    }

    #[test]
    fn test_eof_leaves_values_unchanged() {
        let control = AtomicBlurControl::new(35, 5, 99);
        let stop = AtomicStopSignal::new();

        run_control_loop(Cursor::new(""), &control, &stop);

        assert_eq!(control.current_strength(), 35);
        assert!(!stop.should_stop());
    }
}

use crate::state_machine::{Action, SessionState};
use anyhow::Result;
use std::io::Write;

/// Display surface driven by the state machine.
pub trait View {
    fn set_state(&mut self, state: SessionState) -> Result<()>;
    fn set_transcript(&mut self, transcript: &str) -> Result<()>;
    fn set_output(&mut self, output: &str) -> Result<()>;

    /// Back to a freshly started display.
    fn reset(&mut self) -> Result<()> {
        self.set_state(SessionState::Waiting)?;
        self.set_transcript("")?;
        self.set_output("")
    }
}

/// Apply the view-related part of an action; other actions are a no-op.
pub fn apply(view: &mut impl View, action: &Action) -> Result<()> {
    match action {
        Action::SetState(state) => view.set_state(*state),
        Action::ShowTranscript(t) => view.set_transcript(t),
        Action::ShowOutput(o) => view.set_output(o),
        Action::Reload => view.reset(),
        _ => Ok(()),
    }
}

/// Single-line terminal display: `[state] transcript | output`.
pub struct TerminalView<W: Write> {
    out: W,
    state: SessionState,
    transcript: String,
    output: String,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            state: SessionState::Waiting,
            transcript: String::new(),
            output: String::new(),
        }
    }

    fn line(&self) -> String {
        format!("[{}] {} | {}", self.state, self.transcript, self.output)
    }

    fn redraw(&mut self) -> Result<()> {
        // Carriage return + clear line keeps the display on one row.
        let line = self.line();
        write!(self.out, "\r\x1b[2K{line}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> View for TerminalView<W> {
    fn set_state(&mut self, state: SessionState) -> Result<()> {
        self.state = state;
        self.redraw()
    }

    fn set_transcript(&mut self, transcript: &str) -> Result<()> {
        transcript.clone_into(&mut self.transcript);
        self.redraw()
    }

    fn set_output(&mut self, output: &str) -> Result<()> {
        output.clone_into(&mut self.output);
        self.redraw()
    }
}

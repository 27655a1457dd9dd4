//! Line-oriented session: reads commands, drives the engine, and splices
//! transform results as they arrive.

use std::io::Write;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use wavefront_core::{
    CommitOutcome, Edit, Node, NothingToCommit, Position, Selection, SpliceOutcome,
    TransformCompletion, TransformRequest, Transformer, WavefrontEngine, WrapLayout,
};

use crate::render::render;

pub const HELP: &str = "\
text          type a line (starts a new line when the cursor's line has text)
::text        type a line starting with ':'
:type TEXT    type TEXT at the cursor without starting a new line
:commit       send everything from the frontier to the cursor for rewriting
:show         print the document with the frontier indicator
:cursor N|end move the cursor
:delete A B   delete positions A..B
:clear        delete everything
:state        print the wavefront state
:help         this text
:quit         stop reading input (waits for an outstanding rewrite)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Line(String),
    Type(String),
    Commit,
    Show,
    Cursor(Option<Position>),
    Delete(Position, Position),
    Clear,
    State,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Command::Line(line.to_string()));
        };
        if rest.starts_with(':') {
            return Ok(Command::Line(rest.to_string()));
        }
        let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));
        let command = match name {
            "type" | "t" => Command::Type(args.to_string()),
            "commit" | "c" => Command::Commit,
            "show" | "s" => Command::Show,
            "cursor" => match args.trim() {
                "end" => Command::Cursor(None),
                n => Command::Cursor(Some(position(n)?)),
            },
            "delete" | "d" => {
                let mut parts = args.split_whitespace();
                let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
                    return Err(miette::miette!("usage: :delete A B"));
                };
                Command::Delete(position(a)?, position(b)?)
            }
            "clear" => Command::Clear,
            "state" => Command::State,
            "help" | "h" => Command::Help,
            "quit" | "q" => Command::Quit,
            other => {
                return Err(miette::miette!(
                    help = "try :help",
                    "unknown command `:{other}`"
                ));
            }
        };
        Ok(command)
    }
}

fn position(s: &str) -> Result<Position> {
    s.parse()
        .map_err(|_| miette::miette!("`{s}` is not a document position"))
}

pub struct Session<T> {
    engine: WavefrontEngine<WrapLayout>,
    transformer: Arc<T>,
    completions_tx: mpsc::UnboundedSender<TransformCompletion>,
    completions_rx: mpsc::UnboundedReceiver<TransformCompletion>,
}

impl<T> Session<T>
where
    T: Transformer + Send + Sync + 'static,
{
    pub fn new(engine: WavefrontEngine<WrapLayout>, transformer: T) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            transformer: Arc::new(transformer),
            completions_tx,
            completions_rx,
        }
    }

    pub fn engine(&self) -> &WavefrontEngine<WrapLayout> {
        &self.engine
    }

    /// Process `input` until it ends or `:quit`, then wait for any
    /// outstanding transform to land.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        let mut reading = true;
        loop {
            if !reading && self.engine.pending().is_none() {
                break;
            }
            tokio::select! {
                line = lines.next_line(), if reading => {
                    let Some(line) = line.into_diagnostic()? else {
                        reading = false;
                        continue;
                    };
                    match Command::parse(&line) {
                        Ok(Command::Quit) => reading = false,
                        Ok(command) => {
                            if let Err(err) = self.execute(command, out) {
                                writeln!(out, "error: {err}").into_diagnostic()?;
                            }
                        }
                        Err(err) => writeln!(out, "error: {err}").into_diagnostic()?,
                    }
                }
                Some(completion) = self.completions_rx.recv() => {
                    self.finish(completion, out)?;
                }
                else => break,
            }
        }
        Ok(())
    }

    fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Line(text) => {
                let head = self.engine.document().selection().head;
                let (_, node) = self.engine.document().node_containing(head);
                let fresh_line = matches!(node, Node::TextBlock(block) if block.is_empty());
                if fresh_line {
                    self.engine.type_text(&text)?;
                } else {
                    self.engine.type_text(&format!("\n{text}"))?;
                }
            }
            Command::Type(text) => {
                self.engine.type_text(&text)?;
            }
            Command::Commit => self.commit(out)?,
            Command::Show => write!(out, "{}", render(&self.engine)).into_diagnostic()?,
            Command::Cursor(pos) => {
                let pos = pos.unwrap_or_else(|| self.engine.document().cursor_limit());
                self.engine.set_selection(Selection::collapsed(pos));
            }
            Command::Delete(from, to) => {
                self.engine.edit(Edit::delete(from, to))?;
            }
            Command::Clear => {
                let size = self.engine.document().size();
                self.engine.edit(Edit::delete(0, size))?;
            }
            Command::State => {
                let state = self.engine.state();
                writeln!(
                    out,
                    "phase={:?} frontier_y={} frontier={} cursor_y={} in_flight={} target_y={}",
                    self.engine.phase(),
                    state.frontier_visual_y,
                    self.engine.frontier_position(),
                    state.cursor_visual_y,
                    state.in_flight,
                    state.target_visual_y,
                )
                .into_diagnostic()?;
            }
            Command::Help => writeln!(out, "{HELP}").into_diagnostic()?,
            Command::Quit => {}
        }
        Ok(())
    }

    fn commit<W: Write>(&mut self, out: &mut W) -> Result<()> {
        match self.engine.commit() {
            CommitOutcome::Dispatched(request) => {
                writeln!(
                    out,
                    "committed {} chars as {}",
                    request.text.chars().count(),
                    request.placeholder
                )
                .into_diagnostic()?;
                self.dispatch(request);
            }
            CommitOutcome::Busy => {
                writeln!(out, "busy: a rewrite is still in flight").into_diagnostic()?;
            }
            CommitOutcome::NothingToCommit(reason) => {
                let why = match reason {
                    NothingToCommit::FrontierPastCursor { .. } => "cursor is not past the frontier",
                    NothingToCommit::EmptySpan { .. } => "span is empty",
                    NothingToCommit::Rejected(_) => "document refused the placeholder",
                };
                writeln!(out, "nothing to commit: {why}").into_diagnostic()?;
            }
        }
        Ok(())
    }

    fn dispatch(&self, request: TransformRequest) {
        let transformer = Arc::clone(&self.transformer);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let completion = request.run(transformer.as_ref()).await;
            // A closed channel means the session ended; nothing to splice into.
            let _ = tx.send(completion);
        });
    }

    fn finish<W: Write>(&mut self, completion: TransformCompletion, out: &mut W) -> Result<()> {
        let id = completion.placeholder;
        match self.engine.complete(completion) {
            SpliceOutcome::Spliced { range, fell_back } => {
                let note = if fell_back {
                    " (rewrite failed, kept original)"
                } else {
                    ""
                };
                writeln!(out, "spliced {id} at {}..{}{note}", range.start, range.end)
                    .into_diagnostic()?;
            }
            SpliceOutcome::PlaceholderMissing => {
                writeln!(out, "placeholder {id} was deleted, result dropped").into_diagnostic()?;
            }
            SpliceOutcome::Stale => {
                tracing::debug!(placeholder = %id, "stale completion");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::transformer::CliTransformer;
    use wavefront_core::Document;

    fn session(uppercase: bool) -> Session<CliTransformer> {
        let engine = WavefrontEngine::new(Document::new(), WrapLayout::new(40, 21.0));
        Session::new(
            engine,
            CliTransformer::Delayed {
                delay: Duration::from_millis(5),
                uppercase,
            },
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("hello").unwrap(), Command::Line("hello".into()));
        assert_eq!(Command::parse("::colon").unwrap(), Command::Line(":colon".into()));
        assert_eq!(Command::parse(":type  two spaces").unwrap(), Command::Type(" two spaces".into()));
        assert_eq!(Command::parse(":commit").unwrap(), Command::Commit);
        assert_eq!(Command::parse(":cursor 12").unwrap(), Command::Cursor(Some(12)));
        assert_eq!(Command::parse(":cursor end").unwrap(), Command::Cursor(None));
        assert_eq!(Command::parse(":delete 3 7").unwrap(), Command::Delete(3, 7));
        assert_eq!(Command::parse(":q").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(":delete 3").is_err());
        assert!(Command::parse(":cursor x").is_err());
        assert!(Command::parse(":frobnicate").is_err());
    }

    #[tokio::test]
    async fn test_session_commits_and_splices() {
        let mut session = session(true);
        let input = "helo wrld\n:commit\nmore text\n:commit\n:quit\n";
        let mut out = Vec::new();
        session.run(input.as_bytes(), &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("committed 9 chars as #1"));
        assert!(out.contains("busy"));
        assert!(out.contains("spliced #1"));
        assert_eq!(session.engine().document().text(), "HELO WRLD\nmore text");
    }

    #[tokio::test]
    async fn test_session_reports_bad_input_and_continues() {
        let mut session = session(false);
        let input = ":bogus\n:delete 50 60\nstill here\n";
        let mut out = Vec::new();
        session.run(input.as_bytes(), &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("error:").count(), 2);
        assert_eq!(session.engine().document().text(), "still here");
    }

    #[tokio::test]
    async fn test_clearing_while_in_flight_drops_result() {
        let mut session = session(false);
        let input = "doomed\n:commit\n:clear\n";
        let mut out = Vec::new();
        session.run(input.as_bytes(), &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("placeholder #1 was deleted"));
        assert!(session.engine().document().is_blank());
    }
}

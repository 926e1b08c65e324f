use std::io::{BufRead, Write};
use std::thread;

use crossbeam::channel::{unbounded, Receiver, Sender};
use pulsetone_core::haptic::VibrationSink;
use pulsetone_core::session::{MethodCall, Outcome, Session};
use pulsetone_core::synth::AudioSink;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{Result, ToolError};

#[derive(Clone, Debug)]
pub(crate) enum SessionMessage {
    Call { line: usize, text: String },
}

#[derive(Clone, Debug)]
pub(crate) struct Reply {
    pub line: usize,
    pub body: Value,
}

pub(crate) fn reply_body(result: pulsetone_core::Result<Outcome>) -> Value {
    match result {
        Ok(Outcome::Done) => json!({ "ok": true }),
        Ok(Outcome::Vibrating(pattern)) => json!({ "ok": true, "duty_cycle": pattern.duty_cycle() }),
        Err(e) => json!({ "ok": false, "error": e.to_string() }),
    }
}

/// Owns the session; handles calls in arrival order until every sender is
/// gone, then hands the session back.
pub(crate) fn serve<A: AudioSink, V: VibrationSink>(
    mut session: Session<A, V>,
    calls: Receiver<SessionMessage>,
    replies: Sender<Reply>,
) -> Session<A, V> {
    while let Ok(message) = calls.recv() {
        match message {
            SessionMessage::Call { line, text } => {
                let body = match MethodCall::from_json(&text) {
                    Ok(call) => reply_body(session.dispatch(call)),
                    Err(e) => {
                        debug!(line, error = %e, "unparseable call");
                        json!({ "ok": false, "error": format!("bad call: {e}") })
                    },
                };

                if replies.send(Reply { line, body }).is_err() {
                    warn!("reply receiver gone");
                    break;
                }
            },
        }
    }

    session
}

fn read_calls<R: BufRead>(input: R, sender: Sender<SessionMessage>) -> std::io::Result<()> {
    for (index, text) in input.lines().enumerate() {
        let text = text?;
        if text.trim().is_empty() {
            continue;
        }
        if sender.send(SessionMessage::Call { line: index + 1, text }).is_err() {
            break;
        }
    }
    Ok(())
}

fn report<W: Write>(mut output: W, replies: Receiver<Reply>) -> std::io::Result<()> {
    while let Ok(reply) = replies.recv() {
        debug!(line = reply.line, "reply");
        writeln!(output, "{}", reply.body)?;
        output.flush()?;
    }
    Ok(())
}

/// Feed JSON method calls from `input` through a session thread, writing one
/// JSON reply per call to `output`. Returns the session once input is exhausted.
pub(crate) fn run<A, V, R, W>(session: Session<A, V>, input: R, output: W) -> Result<Session<A, V>>
where
    A: AudioSink + Send + 'static,
    A::Track: Send,
    V: VibrationSink + Send + 'static,
    R: BufRead + Send + 'static,
    W: Write,
{
    let (call_sender, call_receiver) = unbounded();
    let (reply_sender, reply_receiver) = unbounded();

    let reader = thread::Builder::new()
        .name("reader".to_string())
        .spawn(move || read_calls(input, call_sender))?;

    let server = thread::Builder::new()
        .name("session".to_string())
        .spawn(move || serve(session, call_receiver, reply_sender))?;

    report(output, reply_receiver)?;

    let session = server.join().map_err(|_| ToolError::Thread("session"))?;
    reader.join().map_err(|_| ToolError::Thread("reader"))??;

    Ok(session)
}

//! Typed "speech": transcripts read line by line from stdin.
//!
//! A recognizer would deliver the same strings; matching is done by
//! [`VoicePhrases`](paint_gesture::VoicePhrases) on the main thread.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::debug;

/// Spawn a reader over `input` and return the transcript channel.  The
/// thread ends at EOF or when the receiver is dropped.
pub fn spawn_transcript_reader<R: BufRead + Send + 'static>(input: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else { break };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            debug!(transcript = %line, "voice");
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Transcripts typed on the terminal.
pub fn spawn_stdin_transcripts() -> Receiver<String> {
    spawn_transcript_reader(io::BufReader::new(io::stdin()))
}

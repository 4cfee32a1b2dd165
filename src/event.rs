use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, KeyEvent, KeyEventKind};
use tracing::{debug, warn};

pub enum Event {
    Key(KeyEvent, Instant),
    /// No input within one tick interval; carries the wall clock for the frame.
    Tick(Instant),
    Resize,
}

/// Polls the terminal on a background thread so the draw loop never blocks
/// on input.
pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        debug!(tick_ms = tick_rate.as_millis() as u64, "event thread starting");

        thread::spawn(move || loop {
            let ready = match event::poll(tick_rate) {
                Ok(ready) => ready,
                Err(err) => {
                    warn!(%err, "terminal poll failed");
                    false
                }
            };
            let sent = if ready {
                match event::read() {
                    Ok(event::Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        tx.send(Event::Key(key, Instant::now()))
                    }
                    Ok(event::Event::Resize(..)) => tx.send(Event::Resize),
                    _ => Ok(()),
                }
            } else {
                tx.send(Event::Tick(Instant::now()))
            };
            if sent.is_err() {
                return;
            }
        });

        Self { rx }
    }

    pub fn next(&self) -> io::Result<Event> {
        self.rx.recv().map_err(io::Error::other)
    }
}

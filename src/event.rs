use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;

use crate::error::{AppError, Result};

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A mouse event.
    #[allow(dead_code)]
    Mouse(MouseEvent),
    /// A periodic tick for rendering.
    Tick,
    /// Terminal resize event.
    #[allow(dead_code)]
    Resize(u16, u16),
    /// A background persist call finished. `generation` identifies which
    /// mutation triggered it; stale results are ignored by the app.
    SyncDone {
        generation: u64,
        result: std::result::Result<(), String>,
    },
    /// A download trigger finished.
    DownloadDone {
        name: String,
        result: std::result::Result<(), String>,
    },
}

/// Async event handler that polls crossterm events on a dedicated thread
/// and forwards them via a channel. Background tasks (sync, download) push
/// their completions through [`EventHandler::sender`].
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let poll_tx = tx.clone();
        std::thread::spawn(move || loop {
            let ready = event::poll(tick_rate).unwrap_or(false);
            let event = if ready {
                match event::read() {
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Some(Event::Key(key))
                    }
                    Ok(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                    Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                    _ => None,
                }
            } else {
                Some(Event::Tick)
            };
            if let Some(event) = event {
                if poll_tx.send(event).is_err() {
                    // Receiver dropped: the app is shutting down.
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// Sender for background tasks to report completions.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Wait for the next event.
    pub async fn next(&mut self) -> Result<Event> {
        self.rx.recv().await.ok_or_else(|| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "event channel closed",
            ))
        })
    }
}

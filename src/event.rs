use std::io::BufRead;
use tokio::sync::{mpsc, watch};

use crate::controller::SearchState;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// A line typed at the prompt
  Line(String),
  /// Input stream closed
  Eof,
  /// The controller published a new snapshot
  State(SearchState),
}

/// Event handler that merges prompt input and controller state changes
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Read lines from stdin and forward every state change from `states`
  pub fn new(states: watch::Receiver<SearchState>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Plain thread: a pending stdin read must not hold up runtime shutdown
    let input_tx = tx.clone();
    std::thread::spawn(move || {
      for line in std::io::stdin().lock().lines() {
        match line {
          Ok(line) => {
            if input_tx.send(Event::Line(line)).is_err() {
              return;
            }
          }
          Err(_) => break,
        }
      }
      let _ = input_tx.send(Event::Eof);
    });

    Self::forward_states(tx, states);
    Self { rx }
  }

  /// Same as [`EventHandler::new`] but reading from an async source
  #[cfg(test)]
  pub fn with_input<R>(input: R, states: watch::Receiver<SearchState>) -> Self
  where
    R: tokio::io::AsyncBufRead + Unpin + Send + 'static,
  {
    use tokio::io::AsyncBufReadExt;

    let (tx, rx) = mpsc::unbounded_channel();

    let input_tx = tx.clone();
    tokio::spawn(async move {
      let mut lines = input.lines();
      while let Ok(Some(line)) = lines.next_line().await {
        if input_tx.send(Event::Line(line)).is_err() {
          return;
        }
      }
      let _ = input_tx.send(Event::Eof);
    });

    Self::forward_states(tx, states);
    Self { rx }
  }

  fn forward_states(tx: mpsc::UnboundedSender<Event>, mut states: watch::Receiver<SearchState>) {
    tokio::spawn(async move {
      while states.changed().await.is_ok() {
        let snapshot = states.borrow_and_update().clone();
        if tx.send(Event::State(snapshot)).is_err() {
          break;
        }
      }
    });
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

//! Animated "Thinking..." indicator

use crossterm::{cursor, terminal, QueueableCommand};
use std::io::{stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const BARS: &[char] = &['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const NUM_BARS: usize = 6;
const FRAME_DURATION: Duration = Duration::from_millis(80);

/// A spinner that animates on a background task until stopped
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let message = message.to_string();

        let handle = tokio::spawn(async move {
            let mut tick = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                print!("\r\x1b[2m{} {}\x1b[0m", frame(tick), message);
                let _ = stdout().flush();
                tick = tick.wrapping_add(1);
                tokio::time::sleep(FRAME_DURATION).await;
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear its line
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        let mut out = stdout();
        let _ = out
            .queue(cursor::MoveToColumn(0))
            .and_then(|o| o.queue(terminal::Clear(terminal::ClearType::CurrentLine)));
        let _ = out.flush();
    }
}

/// A wave across the bars, shifted one bar per tick
fn frame(tick: usize) -> String {
    (0..NUM_BARS)
        .map(|i| {
            let phase = (tick + i) % (2 * (BARS.len() - 1));
            let height = if phase < BARS.len() {
                phase
            } else {
                2 * (BARS.len() - 1) - phase
            };
            BARS[height]
        })
        .collect()
}
